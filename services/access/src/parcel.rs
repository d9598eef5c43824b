//! Canonical parcel record
//!
//! Parcel rows were written by several generations of the editor. Everything
//! that may arrive in an older shape is normalised here on deserialisation, so
//! the rest of the code only ever sees one representation:
//!
//! - ownership is always `{owners, transferees}`
//! - each document category has its own statically named list
//! - every fee is a `{paid, pending}` pair with `pending` defaulting to `"0"`
//! - empty date strings are absent dates

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{AccessError, AccessResult};

/// Storage bucket holding parcel images and documents
pub const STORAGE_BUCKET: &str = "parcel-images";

/// Folder used for uploads made before the parcel has been saved
const UNSAVED_FOLDER: &str = "temp";

/// Owner or transferee of a parcel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    /// National id number
    pub id: String,
    pub name: String,
    /// KRA PIN
    pub kra: String,
}

/// Current owners and pending transferees of a parcel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<OwnershipShape>")]
pub struct Ownership {
    pub owners: Vec<Person>,
    pub transferees: Vec<Person>,
}

/// Shapes ownership has been stored in over time
#[derive(Deserialize)]
#[serde(untagged)]
enum OwnershipShape {
    Owners(Vec<Person>),
    /// `{owners, transferees}`, the older `{owner, transferees}`, or rows
    /// caught mid-migration carrying both
    Record {
        #[serde(default)]
        owner: Option<Person>,
        #[serde(default)]
        owners: Vec<Person>,
        #[serde(default)]
        transferees: Vec<Person>,
    },
}

impl From<Option<OwnershipShape>> for Ownership {
    fn from(shape: Option<OwnershipShape>) -> Self {
        match shape {
            None => Ownership::default(),
            Some(OwnershipShape::Owners(owners)) => Ownership {
                owners,
                transferees: Vec::new(),
            },
            Some(OwnershipShape::Record {
                owner,
                mut owners,
                transferees,
            }) => {
                if let Some(owner) = owner.filter(|o| !owners.contains(o)) {
                    owners.insert(0, owner);
                }
                Ownership {
                    owners,
                    transferees,
                }
            }
        }
    }
}

/// Kinds of documents attached to a parcel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Dwg,
    Mutations,
    PhysicalPlanning,
    TitleDeed,
    Lcb,
    Transfer,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 6] = [
        DocumentCategory::Dwg,
        DocumentCategory::Mutations,
        DocumentCategory::PhysicalPlanning,
        DocumentCategory::TitleDeed,
        DocumentCategory::Lcb,
        DocumentCategory::Transfer,
    ];

    /// Storage folder for this category
    pub fn folder(&self) -> &'static str {
        match self {
            DocumentCategory::Dwg => "dwg",
            DocumentCategory::Mutations => "mutations",
            DocumentCategory::PhysicalPlanning => "physical_planning",
            DocumentCategory::TitleDeed => "title_deed",
            DocumentCategory::Lcb => "lcb",
            DocumentCategory::Transfer => "transfer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentCategory::Dwg => "DWG Files",
            DocumentCategory::Mutations => "Mutations",
            DocumentCategory::PhysicalPlanning => "Physical Planning",
            DocumentCategory::TitleDeed => "Title Deed",
            DocumentCategory::Lcb => "LCB",
            DocumentCategory::Transfer => "Transfer",
        }
    }

    /// Lower-case file extensions accepted for upload
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            DocumentCategory::Dwg => &["dwg", "doc", "docx", "bak"],
            _ => &["pdf"],
        }
    }

    pub fn accepts(&self, file_name: &str) -> bool {
        file_extension(file_name)
            .is_some_and(|ext| self.accepted_extensions().contains(&ext.as_str()))
    }

    /// Object path for a new upload: `{folder}/{parcel id or temp}/{millis}-{file name}`
    pub fn storage_path(
        &self,
        parcel_id: Option<Uuid>,
        file_name: &str,
        uploaded_at: DateTime<Utc>,
    ) -> String {
        let parcel = parcel_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| UNSAVED_FOLDER.to_string());

        format!(
            "{}/{}/{}-{}",
            self.folder(),
            parcel,
            uploaded_at.timestamp_millis(),
            file_name
        )
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Object path inside [`STORAGE_BUCKET`] for a public file URL
pub fn object_path(url: &str) -> Option<&str> {
    let marker = format!("/{}/", STORAGE_BUCKET);
    url.split_once(marker.as_str())
        .map(|(_, path)| path)
        .filter(|path| !path.is_empty())
}

/// A document stored for a parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    /// Drawing files record their kind (`dwg`, `bak`, `doc`)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl DocumentFile {
    /// Object path inside the storage bucket
    pub fn object_path(&self) -> Option<&str> {
        object_path(&self.url)
    }
}

/// Documents of a parcel, one list per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelDocuments {
    #[serde(deserialize_with = "null_as_empty")]
    pub dwg_files: Vec<DocumentFile>,
    #[serde(deserialize_with = "null_as_empty")]
    pub mutations_files: Vec<DocumentFile>,
    #[serde(deserialize_with = "null_as_empty")]
    pub physical_planning_files: Vec<DocumentFile>,
    #[serde(deserialize_with = "null_as_empty")]
    pub title_deed_files: Vec<DocumentFile>,
    #[serde(deserialize_with = "null_as_empty")]
    pub lcb_files: Vec<DocumentFile>,
    #[serde(deserialize_with = "null_as_empty")]
    pub transfer_files: Vec<DocumentFile>,
}

impl ParcelDocuments {
    pub fn files(&self, category: DocumentCategory) -> &[DocumentFile] {
        match category {
            DocumentCategory::Dwg => &self.dwg_files,
            DocumentCategory::Mutations => &self.mutations_files,
            DocumentCategory::PhysicalPlanning => &self.physical_planning_files,
            DocumentCategory::TitleDeed => &self.title_deed_files,
            DocumentCategory::Lcb => &self.lcb_files,
            DocumentCategory::Transfer => &self.transfer_files,
        }
    }

    pub fn files_mut(&mut self, category: DocumentCategory) -> &mut Vec<DocumentFile> {
        match category {
            DocumentCategory::Dwg => &mut self.dwg_files,
            DocumentCategory::Mutations => &mut self.mutations_files,
            DocumentCategory::PhysicalPlanning => &mut self.physical_planning_files,
            DocumentCategory::TitleDeed => &mut self.title_deed_files,
            DocumentCategory::Lcb => &mut self.lcb_files,
            DocumentCategory::Transfer => &mut self.transfer_files,
        }
    }

    /// Attach a file, rejecting extensions the category does not accept
    pub fn attach(&mut self, category: DocumentCategory, file: DocumentFile) -> AccessResult<()> {
        if !category.accepts(&file.name) {
            return Err(AccessError::InvalidInput(format!(
                "{} is not a valid {} file",
                file.name,
                category.label()
            )));
        }
        self.files_mut(category).push(file);
        Ok(())
    }

    /// Detach the file at `index`, returning it
    pub fn remove(&mut self, category: DocumentCategory, index: usize) -> Option<DocumentFile> {
        let files = self.files_mut(category);
        (index < files.len()).then(|| files.remove(index))
    }

    /// Storage object paths of every attached document, for cleanup on delete
    pub fn object_paths(&self) -> Vec<&str> {
        DocumentCategory::ALL
            .iter()
            .flat_map(|category| self.files(*category))
            .filter_map(DocumentFile::object_path)
            .collect()
    }
}

/// The ten fees tracked for a parcel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    Survey,
    Board,
    Title,
    Transfer,
    Rim,
    StampDuty,
    PhysicalPlanning,
    Search,
    OtherServices,
    Succession,
}

impl FeeKind {
    pub const ALL: [FeeKind; 10] = [
        FeeKind::Survey,
        FeeKind::Board,
        FeeKind::Title,
        FeeKind::Transfer,
        FeeKind::Rim,
        FeeKind::StampDuty,
        FeeKind::PhysicalPlanning,
        FeeKind::Search,
        FeeKind::OtherServices,
        FeeKind::Succession,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FeeKind::Survey => "Survey Fees",
            FeeKind::Board => "Board Fees",
            FeeKind::Title => "Title Fees",
            FeeKind::Transfer => "Transfer Fees",
            FeeKind::Rim => "RIM Fees",
            FeeKind::StampDuty => "Stamp Duty",
            FeeKind::PhysicalPlanning => "Physical Planning Fees",
            FeeKind::Search => "Search Fees",
            FeeKind::OtherServices => "Other Services",
            FeeKind::Succession => "Succession Fees",
        }
    }
}

/// Amounts paid and still pending for one fee, as entered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default)]
    pub paid: String,
    #[serde(default = "zero_amount")]
    pub pending: String,
}

fn zero_amount() -> String {
    "0".to_string()
}

impl Default for Fee {
    fn default() -> Self {
        Self {
            paid: String::new(),
            pending: zero_amount(),
        }
    }
}

/// Fees of a parcel, one statically named field per [`FeeKind`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    #[serde(deserialize_with = "null_as_default")]
    pub survey_fees: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub board_fees: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub title_fees: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub transfer_fees: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub rim_fees: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub stamp_duty: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub physical_planning_fees: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub search_fees: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub other_services: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub succession_fees: Fee,
}

impl FeeSchedule {
    pub fn get(&self, kind: FeeKind) -> &Fee {
        match kind {
            FeeKind::Survey => &self.survey_fees,
            FeeKind::Board => &self.board_fees,
            FeeKind::Title => &self.title_fees,
            FeeKind::Transfer => &self.transfer_fees,
            FeeKind::Rim => &self.rim_fees,
            FeeKind::StampDuty => &self.stamp_duty,
            FeeKind::PhysicalPlanning => &self.physical_planning_fees,
            FeeKind::Search => &self.search_fees,
            FeeKind::OtherServices => &self.other_services,
            FeeKind::Succession => &self.succession_fees,
        }
    }

    pub fn get_mut(&mut self, kind: FeeKind) -> &mut Fee {
        match kind {
            FeeKind::Survey => &mut self.survey_fees,
            FeeKind::Board => &mut self.board_fees,
            FeeKind::Title => &mut self.title_fees,
            FeeKind::Transfer => &mut self.transfer_fees,
            FeeKind::Rim => &mut self.rim_fees,
            FeeKind::StampDuty => &mut self.stamp_duty,
            FeeKind::PhysicalPlanning => &mut self.physical_planning_fees,
            FeeKind::Search => &mut self.search_fees,
            FeeKind::OtherServices => &mut self.other_services,
            FeeKind::Succession => &mut self.succession_fees,
        }
    }
}

/// A payment received against a parcel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default = "zero_amount")]
    pub amount: String,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub payment_date: Option<NaiveDate>,
}

impl Default for PaymentRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            amount: zero_amount(),
            payment_date: None,
        }
    }
}

/// A land parcel as stored in the `parcels` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub parcel_number: String,
    /// Stored in the `owners` column
    #[serde(default, rename = "owners")]
    pub ownership: Ownership,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub survey_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub fees: FeeSchedule,
    /// Public image URLs
    #[serde(default, rename = "imagesurl", deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub documents: ParcelDocuments,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub payment_records: Vec<PaymentRecord>,
}

impl Parcel {
    pub fn validate(&self) -> AccessResult<()> {
        if self.parcel_number.trim().is_empty() {
            return Err(AccessError::InvalidInput(
                "Parcel number is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Every storage object owned by this parcel, images included
    pub fn object_paths(&self) -> Vec<&str> {
        let images = self.images.iter().filter_map(|url| object_path(url));
        images.chain(self.documents.object_paths()).collect()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            // Some rows carry a full timestamp rather than a date
            let date = value.get(..10).unwrap_or(value);
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
    }
}
