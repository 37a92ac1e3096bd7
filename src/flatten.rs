use crate::domain::{ImportedRow, Observation, split_coordinates};
use crate::error::{ErrorKind, ErrorLog, ImportError, LookupKind};
use crate::http::Transport;
use crate::inat::InatApi;
use crate::places::resolve_places;
use crate::taxonomy::resolve_taxonomy;

/// Observation field names as they appear on iNaturalist.
pub mod field {
    pub const ACCESSION_NUMBER: &str = "Accession Number";
    pub const FUNDIS_TAG_NUMBER: &str = "FUNDIS Tag Number";
    pub const MICROSCOPY_REQUESTED: &str = "Microscopy Requested";
    pub const MYCOMAP_BLAST_RESULTS: &str = "MycoMap BLAST Results";
    pub const MYCOPORTAL_LINK: &str = "MyCoPortal Link";
    pub const PROVISIONAL_SPECIES_NAME: &str = "Provisional Species Name";
    pub const VOUCHER_NUMBER: &str = "Voucher Number";
    pub const VOUCHER_NUMBERS: &str = "Voucher Number(s)";
    pub const DNA_BARCODE_ITS: &str = "DNA Barcode ITS";
    pub const DNA_BARCODE_ITS_2: &str = "DNA Barcode ITS #2";
    pub const DNA_BARCODE_LSU: &str = "DNA Barcode LSU";
}

/// Builds the row from the observation alone; place and taxonomy columns stay
/// null until merged.
pub fn build_row(observation: &Observation) -> ImportedRow {
    let (latitude, longitude) = split_coordinates(observation.location.as_deref());
    let (private_latitude, private_longitude) =
        split_coordinates(observation.private_location.as_deref());
    let user = observation.user.as_ref();

    ImportedRow {
        id: observation.id,
        date: observation.observed_date(),
        user_name: user.and_then(|user| user.name.clone()),
        user_login: user.and_then(|user| user.login.clone()),
        description: observation.description.clone(),
        latitude,
        longitude,
        private_latitude,
        private_longitude,
        coordinates_obscured: observation.coordinates_obscured().to_string(),
        scientific_name: observation
            .taxon
            .as_ref()
            .and_then(|taxon| taxon.name.clone()),
        accession_number: observation.custom_field(field::ACCESSION_NUMBER),
        fundis_tag_number: observation.custom_field(field::FUNDIS_TAG_NUMBER),
        microscopy_requested: observation.custom_field(field::MICROSCOPY_REQUESTED),
        mycomap_blast_results: observation.custom_field(field::MYCOMAP_BLAST_RESULTS),
        mycoportal_link: observation.custom_field(field::MYCOPORTAL_LINK),
        provisional_species_name: observation.custom_field(field::PROVISIONAL_SPECIES_NAME),
        voucher_number: observation.custom_field(field::VOUCHER_NUMBER),
        voucher_numbers: observation.custom_field(field::VOUCHER_NUMBERS),
        dna_barcode_its: observation.custom_field(field::DNA_BARCODE_ITS),
        dna_barcode_its_2: observation.custom_field(field::DNA_BARCODE_ITS_2),
        dna_barcode_lsu: observation.custom_field(field::DNA_BARCODE_LSU),
        ..ImportedRow::default()
    }
}

/// Flattens one observation, resolving places and ancestry over the API.
/// Lookup failures leave the affected columns null and land in `errors`.
pub fn flatten<T: Transport>(
    api: &InatApi<T>,
    observation: &Observation,
    errors: &mut ErrorLog,
) -> ImportedRow {
    let mut row = build_row(observation);

    let place_ids = observation.place_ids();
    if !place_ids.is_empty() {
        match resolve_places(api, place_ids, observation.id) {
            Ok(place) => row.merge_place(place),
            Err(err) => record_lookup_failure(errors, &err, LookupKind::Location, observation.id),
        }
    }

    let ancestor_ids = observation.ancestor_ids();
    if !ancestor_ids.is_empty() {
        match resolve_taxonomy(api, ancestor_ids, observation.id) {
            Ok(taxonomy) => row.merge_taxonomy(taxonomy),
            Err(err) => record_lookup_failure(errors, &err, LookupKind::Taxonomy, observation.id),
        }
    }

    row
}

/// A failed request is followed by the not-found entry naming the observation.
fn record_lookup_failure(
    errors: &mut ErrorLog,
    err: &ImportError,
    kind: LookupKind,
    observation_id: u64,
) {
    errors.record(err);
    if err.kind() != ErrorKind::LookupNotFound {
        errors.record(&ImportError::LookupNotFound {
            kind,
            observation_id,
        });
    }
}
