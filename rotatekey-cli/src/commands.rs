pub mod builtin;
pub mod check_inventory;
pub mod snmp;
