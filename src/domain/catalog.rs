//! Fixed tariff taxonomy.
//!
//! Identifiers are the only form that may appear as feature-table column names;
//! labels are for display. The mapping is a fixed bijection.

use crate::error::AppError;

/// A tariff category keyed by its HS chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TariffCategory {
    pub id: &'static str,
    pub label: &'static str,
}

impl TariffCategory {
    pub fn lag_column(&self) -> String {
        lag_column(self.id)
    }

    pub fn future_column(&self) -> String {
        future_column(self.id)
    }
}

pub const CATALOG: [TariffCategory; 22] = [
    TariffCategory { id: "start_tariff_39", label: "Chapter 39 – Plastics and articles thereof" },
    TariffCategory { id: "start_tariff_40", label: "Chapter 40 – Rubber and articles thereof" },
    TariffCategory { id: "start_tariff_72", label: "Chapter 72 – Iron and steel" },
    TariffCategory { id: "start_tariff_73", label: "Chapter 73 – Articles of iron or steel" },
    TariffCategory { id: "start_tariff_74", label: "Chapter 74 – Copper and articles thereof" },
    TariffCategory { id: "start_tariff_75", label: "Chapter 75 – Nickel and articles thereof" },
    TariffCategory { id: "start_tariff_76", label: "Chapter 76 – Aluminum and articles thereof" },
    TariffCategory { id: "start_tariff_78", label: "Chapter 78 – Lead and articles thereof" },
    TariffCategory { id: "start_tariff_79", label: "Chapter 79 – Zinc and articles thereof" },
    TariffCategory { id: "start_tariff_80", label: "Chapter 80 – Tin and articles thereof" },
    TariffCategory { id: "start_tariff_81", label: "Chapter 81 – Other base metals; cermets" },
    TariffCategory { id: "start_tariff_82", label: "Chapter 82 – Tools, implements, cutlery of base metal" },
    TariffCategory { id: "start_tariff_83", label: "Chapter 83 – Miscellaneous articles of base metal" },
    TariffCategory { id: "start_tariff_84", label: "Chapter 84 – Nuclear reactors, boilers, machinery" },
    TariffCategory { id: "start_tariff_85", label: "Chapter 85 – Electrical machinery and equipment" },
    TariffCategory { id: "start_tariff_86", label: "Chapter 86 – Railway locomotives and rolling stock" },
    TariffCategory { id: "start_tariff_87", label: "Chapter 87 – Vehicles other than railway" },
    TariffCategory { id: "start_tariff_88", label: "Chapter 88 – Aircraft, spacecraft and parts" },
    TariffCategory { id: "start_tariff_89", label: "Chapter 89 – Ships, boats and floating structures" },
    TariffCategory { id: "start_tariff_90", label: "Chapter 90 – Optical, photographic, medical instruments" },
    TariffCategory { id: "start_tariff_96", label: "Chapter 96 – Miscellaneous manufactured articles" },
    TariffCategory { id: "start_tariff_98", label: "Chapter 98 – Special classification provisions" },
];

pub fn lag_column(id: &str) -> String {
    format!("{id}_lag_effect")
}

pub fn future_column(id: &str) -> String {
    format!("{id}_future_effect")
}

/// Look up a category by its stable identifier.
pub fn find(id: &str) -> Option<&'static TariffCategory> {
    CATALOG.iter().find(|c| c.id == id)
}

/// Look up a category by identifier, failing with an input error.
pub fn require(id: &str) -> Result<&'static TariffCategory, AppError> {
    find(id).ok_or_else(|| AppError::input(format!("Unknown tariff category `{id}`.")))
}

/// Look up a category by its display label (UI direction of the bijection).
pub fn find_by_label(label: &str) -> Option<&'static TariffCategory> {
    CATALOG.iter().find(|c| c.label == label)
}

pub fn is_tariff_column(name: &str) -> bool {
    find(name).is_some()
}

/// Flag, lag or future column of a catalog tariff.
pub fn is_tariff_feature(name: &str) -> bool {
    let id = name
        .strip_suffix("_lag_effect")
        .or_else(|| name.strip_suffix("_future_effect"))
        .unwrap_or(name);
    is_tariff_column(id)
}
