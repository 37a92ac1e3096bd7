use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ImportError;

/// One observation as returned by `/v1/observations`, reduced to the fields the
/// importer reads. Everything except `id` is optional on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub id: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub observed_on_details: Option<ObservedOn>,
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<Author>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub private_location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub geoprivacy: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub place_ids: Option<Vec<u64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub taxon: Option<Taxon>,
    #[serde(default, deserialize_with = "lenient")]
    pub ofvs: Option<Vec<CustomField>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservedOn {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Taxon {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ancestor_ids: Option<Vec<u64>>,
}

/// Observation field value ("ofv") attached by the observer.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomField {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl CustomField {
    pub fn value_string(&self) -> Option<String> {
        self.value.as_ref().and_then(value_to_string)
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}

/// Text fields accept any JSON scalar so one odd value cannot drop a record.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

/// Nested values of the wrong shape read as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl Observation {
    pub fn from_value(value: Value) -> Result<Self, ImportError> {
        serde_json::from_value(value).map_err(|err| ImportError::Decode(err.to_string()))
    }

    pub fn observed_date(&self) -> Option<String> {
        self.observed_on_details
            .as_ref()
            .and_then(|details| details.date.clone())
    }

    pub fn place_ids(&self) -> &[u64] {
        self.place_ids.as_deref().unwrap_or(&[])
    }

    pub fn ancestor_ids(&self) -> &[u64] {
        self.taxon
            .as_ref()
            .and_then(|taxon| taxon.ancestor_ids.as_deref())
            .unwrap_or(&[])
    }

    pub fn coordinates_obscured(&self) -> bool {
        self.geoprivacy
            .as_deref()
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }

    /// First custom field whose name matches exactly.
    pub fn custom_field(&self, name: &str) -> Option<String> {
        self.ofvs
            .as_ref()?
            .iter()
            .find(|field| field.name.as_deref() == Some(name))
            .and_then(CustomField::value_string)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedPlace {
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedTaxonomy {
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub tribe: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
}

/// Flat row persisted into `inatimported`. Every column is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportedRow {
    pub id: u64,
    pub date: Option<String>,
    pub user_name: Option<String>,
    pub user_login: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub private_latitude: Option<String>,
    pub private_longitude: Option<String>,
    pub coordinates_obscured: String,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub scientific_name: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub tribe: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub accession_number: Option<String>,
    pub fundis_tag_number: Option<String>,
    pub microscopy_requested: Option<String>,
    pub mycomap_blast_results: Option<String>,
    pub mycoportal_link: Option<String>,
    pub provisional_species_name: Option<String>,
    pub voucher_number: Option<String>,
    pub voucher_numbers: Option<String>,
    pub dna_barcode_its: Option<String>,
    pub dna_barcode_its_2: Option<String>,
    pub dna_barcode_lsu: Option<String>,
}

impl ImportedRow {
    pub const COLUMNS: [&'static str; 32] = [
        "id",
        "date",
        "user_name",
        "user_login",
        "description",
        "latitude",
        "longitude",
        "private_latitude",
        "private_longitude",
        "coordinates_obscured",
        "county",
        "state",
        "country",
        "scientific_name",
        "phylum",
        "class",
        "order",
        "family",
        "tribe",
        "genus",
        "species",
        "accession_number",
        "fundis_tag_number",
        "microscopy_requested",
        "mycomap_blast_results",
        "mycoportal_link",
        "provisional_species_name",
        "voucher_number",
        "voucher_numbers",
        "dna_barcode_its",
        "dna_barcode_its_2",
        "dna_barcode_lsu",
    ];

    pub fn merge_place(&mut self, place: ResolvedPlace) {
        self.county = place.county;
        self.state = place.state;
        self.country = place.country;
    }

    pub fn merge_taxonomy(&mut self, taxonomy: ResolvedTaxonomy) {
        self.phylum = taxonomy.phylum;
        self.class = taxonomy.class;
        self.order = taxonomy.order;
        self.family = taxonomy.family;
        self.tribe = taxonomy.tribe;
        self.genus = taxonomy.genus;
        self.species = taxonomy.species;
    }
}

/// Splits a `"lat,lng"` pair on its first comma.
pub fn split_coordinates(location: Option<&str>) -> (Option<String>, Option<String>) {
    match location.filter(|value| !value.is_empty()) {
        Some(value) => match value.split_once(',') {
            Some((lat, lng)) => (Some(lat.to_string()), Some(lng.to_string())),
            None => (Some(value.to_string()), None),
        },
        None => (None, None),
    }
}
