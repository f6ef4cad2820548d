// crates/scl-ied/src/constants.rs
//! Tag names, attribute names and defaults of the SCL subset read by the engine.

// --- Instance tree ---

pub const TAG_IED: &str = "IED";
pub const TAG_ACCESS_POINT: &str = "AccessPoint";
pub const TAG_SERVER: &str = "Server";
pub const TAG_LDEVICE: &str = "LDevice";
pub const TAG_LN0: &str = "LN0";
pub const TAG_LN: &str = "LN";
pub const TAG_DOI: &str = "DOI";
pub const TAG_SDI: &str = "SDI";
pub const TAG_DAI: &str = "DAI";
pub const TAG_VAL: &str = "Val";
pub const TAG_SETTING_CONTROL: &str = "SettingControl";

// --- Type templates ---

pub const TAG_DATA_TYPE_TEMPLATES: &str = "DataTypeTemplates";
pub const TAG_LNODE_TYPE: &str = "LNodeType";
pub const TAG_DO_TYPE: &str = "DOType";
pub const TAG_DA_TYPE: &str = "DAType";
pub const TAG_ENUM_TYPE: &str = "EnumType";
pub const TAG_ENUM_VAL: &str = "EnumVal";
pub const TAG_DO: &str = "DO";
pub const TAG_SDO: &str = "SDO";
pub const TAG_DA: &str = "DA";
pub const TAG_BDA: &str = "BDA";

/// Template members that expand into child types.
pub const MEMBER_TAGS: [&str; 4] = [TAG_DO, TAG_DA, TAG_SDO, TAG_BDA];

/// Instance containers matched against template members.
pub const CONTAINER_TAGS: [&str; 3] = [TAG_DOI, TAG_SDI, TAG_DAI];

/// Logical node tags.
pub const LN_TAGS: [&str; 2] = [TAG_LN0, TAG_LN];

// --- Attributes ---

pub const ATTR_NAME: &str = "name";
pub const ATTR_ID: &str = "id";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_BTYPE: &str = "bType";
pub const ATTR_DESC: &str = "desc";
pub const ATTR_LN_TYPE: &str = "lnType";
pub const ATTR_LN_CLASS: &str = "lnClass";
pub const ATTR_INST: &str = "inst";
pub const ATTR_PREFIX: &str = "prefix";
pub const ATTR_FC: &str = "fc";
pub const ATTR_SGROUP: &str = "sGroup";
pub const ATTR_ORD: &str = "ord";
pub const ATTR_NUM_OF_SGS: &str = "numOfSGs";
pub const ATTR_ACT_SG: &str = "actSG";
pub const ATTR_VAL_KIND: &str = "valKind";
pub const ATTR_LD_NAME: &str = "ldName";
pub const ATTR_CDC: &str = "cdc";

/// Attributes scanned by the search index, compared case-insensitively.
pub const SEARCH_ATTRIBUTES: [&str; 10] = [
    ATTR_INST,
    ATTR_DESC,
    ATTR_LN_CLASS,
    ATTR_LN_TYPE,
    ATTR_ID,
    ATTR_NAME,
    ATTR_TYPE,
    ATTR_CDC,
    ATTR_FC,
    ATTR_BTYPE,
];

// --- Setting groups ---

/// `DOI` on `LLN0` that redirects setting-group control to another device.
pub const GR_REF_DOI: &str = "GrRef";
/// `DAI` below `GrRef` holding the referenced logical device.
pub const SET_SRC_REF_DAI: &str = "setSrcRef";

/// Setting functional constraints: values are kept per setting group.
pub const FC_SETTING_GROUP: &str = "SG";
pub const FC_SETTING_GROUP_EDITABLE: &str = "SE";

/// `valKind` marking a read-only attribute.
pub const VAL_KIND_READ_ONLY: &str = "RO";

pub const BTYPE_ENUM: &str = "Enum";

// --- Defaults ---

/// Quiescence window of the search input, in microseconds.
pub const DEFAULT_SEARCH_DEBOUNCE_US: u64 = 250_000;
