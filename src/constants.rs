/// Column names and valid-value sets shared by both fisheries datasets.
/// Per-dataset descriptors are assembled from these in `dataset.rs`.

// Core columns
pub const YEAR_COLUMN: &str = "year";
pub const AREA_ID_COLUMN: &str = "area_id";
pub const ISLAND_COLUMN: &str = "island";
pub const COUNTY_COLUMN: &str = "county";
pub const SPECIES_GROUP_COLUMN: &str = "species_group";
pub const ECOSYSTEM_TYPE_COLUMN: &str = "ecosystem_type";
pub const EXCHANGE_VALUE_COLUMN: &str = "exchange_value";

// Display-only columns
pub const COUNTY_OLELO_COLUMN: &str = "county_olelo";
pub const ISLAND_OLELO_COLUMN: &str = "island_olelo";
pub const EXCHANGE_VALUE_FORMATTED_COLUMN: &str = "exchange_value_formatted";

pub const DISPLAY_ONLY_COLUMNS: &[&str] = &[
    COUNTY_OLELO_COLUMN,
    ISLAND_OLELO_COLUMN,
    EXCHANGE_VALUE_FORMATTED_COLUMN,
];

// Input file discovery
pub const COMMERCIAL_FILE_PATTERN: &str = "*tidied_comm_ev*.csv";
pub const COMMERCIAL_FALLBACK_PATTERN: &str = "*comm_ev*.csv";
pub const NONCOMMERCIAL_FILE_PATTERN: &str = "*tidied_noncomm_ev*.csv";
pub const NONCOMMERCIAL_FALLBACK_PATTERN: &str = "*noncomm_ev*.csv";
pub const NONCOMMERCIAL_NAME_MARKER: &str = "noncomm";

pub const VALID_COUNTIES: &[&str] = &["Hawaii", "Maui", "Honolulu", "Kauai", "Kalawao"];

pub const VALID_ISLANDS: &[&str] = &["Hawaii", "Kauai", "Lanai", "Maui", "Molokai", "Oahu"];

pub const COMMERCIAL_MIN_YEAR: i64 = 1997;
pub const COMMERCIAL_MAX_YEAR: i64 = 2021;

pub const NONCOMMERCIAL_MIN_YEAR: i64 = 2005;
pub const NONCOMMERCIAL_MAX_YEAR: i64 = 2022;

pub const COMMERCIAL_SPECIES_GROUPS: &[&str] = &[
    "Deep 7 Bottomfish",
    "Shallow Bottomfish",
    "Pelagics",
    "Reef-Associated",
    ALL_SPECIES,
];

pub const NONCOMMERCIAL_SPECIES_GROUPS: &[&str] = &["Herbivores"];

pub const ECOSYSTEM_TYPES: &[&str] = &["Inshore — Reef", "Coastal — Open Ocean", ALL_ECOSYSTEMS];

// Aggregate sentinels
pub const ALL_SPECIES: &str = "All Species";
pub const ALL_ECOSYSTEMS: &str = "All Ecosystems";

/// Tokens read as missing values when loading CSV input
pub const MISSING_VALUE_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// Output naming
pub const EXPORT_DATE_FORMAT: &str = "%Y%m%d";
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const SUMMARY_FILE_PREFIX: &str = "cleaning_summary_";
pub const LOG_FILE_PREFIX: &str = "cleaning_pipeline_";
