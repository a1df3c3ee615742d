use serde::{Deserialize, Serialize};

/// Report sections, in render order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Identity,
    Health,
    Hardware,
    Storage,
    Network,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Identity,
        Section::Health,
        Section::Hardware,
        Section::Storage,
        Section::Network,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Identity => "IDENTITY",
            Section::Health => "HEALTH",
            Section::Hardware => "HARDWARE",
            Section::Storage => "STORAGE",
            Section::Network => "NETWORK",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub section: Section,
}

const fn field(key: &'static str, label: &'static str, section: Section) -> FieldSpec {
    FieldSpec {
        key,
        label,
        section,
    }
}

/// Known report fields. Keys double as probe names and as the flat keys of
/// the structured document.
pub const FIELDS: &[FieldSpec] = &[
    field("user", "User", Section::Identity),
    field("domain", "Domain", Section::Identity),
    field("av", "Antivirus", Section::Health),
    field("uptime", "Uptime", Section::Health),
    field("reboot", "Last boot", Section::Health),
    field("os", "Operating system", Section::Hardware),
    field("mobo", "Motherboard", Section::Hardware),
    field("cpu", "Processor", Section::Hardware),
    field("ram", "Memory", Section::Hardware),
    field("vga", "Graphics", Section::Hardware),
    field("disk", "Disks", Section::Storage),
    field("net_name", "Adapter", Section::Network),
    field("net_mac", "MAC address", Section::Network),
    field("net_speed", "Link speed", Section::Network),
    field("net_ip", "IP address", Section::Network),
    field("net_gw", "Gateway", Section::Network),
    field("net_dns", "DNS servers", Section::Network),
    field("net_ping", "Internet", Section::Network),
];

pub fn lookup(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.key == key)
}

pub fn in_section(section: Section) -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(move |f| f.section == section)
}
