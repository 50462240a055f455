use core::fmt;
use core::fmt::Display;

/// Network OS learned from `show version` when a session opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
    IosXe,
    IosXr,
    Nxos,
    Eos,
}

impl Platform {
    /// Matches the banner lines each OS prints first in `show version`.
    /// More specific markers are tried before the generic IOS one.
    pub fn detect(show_version: &str) -> Option<Platform> {
        const MARKERS: [(&str, Platform); 7] = [
            ("Cisco IOS XE Software", Platform::IosXe),
            ("IOS-XE Software", Platform::IosXe),
            ("Cisco IOS XR Software", Platform::IosXr),
            ("Cisco Nexus Operating System", Platform::Nxos),
            ("NX-OS", Platform::Nxos),
            ("Arista", Platform::Eos),
            ("Cisco IOS Software", Platform::Ios),
        ];
        MARKERS
            .iter()
            .find(|(marker, _)| show_version.contains(marker))
            .map(|(_, platform)| *platform)
    }

    pub fn capabilities(self) -> Capabilities {
        let commit = match self {
            Platform::IosXr => Some("commit"),
            _ => None,
        };
        Capabilities {
            platform: self,
            running_config: "show running-config",
            config_enter: "configure terminal",
            config_commit: commit,
            config_exit: "end",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Ios => "ios",
            Platform::IosXe => "iosxe",
            Platform::IosXr => "iosxr",
            Platform::Nxos => "nxos",
            Platform::Eos => "eos",
        };
        f.write_str(name)
    }
}

/// Command set the session backend needs from a platform: a filtered read
/// of the running configuration and a way to apply configuration lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    platform: Platform,
    running_config: &'static str,
    config_enter: &'static str,
    config_commit: Option<&'static str>,
    config_exit: &'static str,
}

impl Capabilities {
    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn filtered_running_config(&self, pattern: &str) -> String {
        format!("{} | include {}", self.running_config, pattern)
    }

    /// Full command sequence that applies `lines` from exec mode and returns
    /// to exec mode.
    pub fn config_script(&self, lines: &[String]) -> Vec<String> {
        let mut script = Vec::with_capacity(lines.len() + 3);
        script.push(self.config_enter.to_string());
        script.extend(lines.iter().cloned());
        if let Some(commit) = self.config_commit {
            script.push(commit.to_string());
        }
        script.push(self.config_exit.to_string());
        script
    }

    pub fn config_exit(&self) -> &'static str {
        self.config_exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect() {
        let iosxe = "Cisco IOS XE Software, Version 17.03.04a\nCisco IOS Software [Amsterdam], Virtual XE Software";
        assert_eq!(Platform::detect(iosxe), Some(Platform::IosXe));
        assert_eq!(
            Platform::detect("Cisco IOS Software, C2960 Software (C2960-LANBASEK9-M), Version 15.0(2)SE"),
            Some(Platform::Ios)
        );
        assert_eq!(
            Platform::detect("Cisco Nexus Operating System (NX-OS) Software"),
            Some(Platform::Nxos)
        );
        assert_eq!(
            Platform::detect("Cisco IOS XR Software, Version 7.3.2"),
            Some(Platform::IosXr)
        );
        assert_eq!(Platform::detect("Arista DCS-7050TX-64"), Some(Platform::Eos));
        assert_eq!(Platform::detect("Linux 6.1.0 x86_64"), None);
    }

    #[test]
    fn test_config_script() {
        let lines = vec!["snmp-server community public ro".to_string()];
        assert_eq!(
            Platform::IosXe.capabilities().config_script(&lines),
            vec!["configure terminal", "snmp-server community public ro", "end"]
        );
        assert_eq!(
            Platform::IosXr.capabilities().config_script(&lines),
            vec![
                "configure terminal",
                "snmp-server community public ro",
                "commit",
                "end"
            ]
        );
        assert_eq!(
            Platform::Nxos
                .capabilities()
                .filtered_running_config("snmp-server community"),
            "show running-config | include snmp-server community"
        );
    }
}
