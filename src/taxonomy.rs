use crate::domain::ResolvedTaxonomy;
use crate::error::{ImportError, LookupKind};
use crate::http::Transport;
use crate::inat::{InatApi, TaxonRecord};

pub fn resolve_taxonomy<T: Transport>(
    api: &InatApi<T>,
    ancestor_ids: &[u64],
    observation_id: u64,
) -> Result<ResolvedTaxonomy, ImportError> {
    let taxa = api.fetch_taxa(ancestor_ids)?;
    if taxa.is_empty() {
        return Err(ImportError::LookupNotFound {
            kind: LookupKind::Taxonomy,
            observation_id,
        });
    }
    Ok(reduce_taxonomy(&taxa))
}

pub fn reduce_taxonomy(taxa: &[TaxonRecord]) -> ResolvedTaxonomy {
    let mut ladder = ResolvedTaxonomy::default();
    for taxon in taxa {
        let name = taxon.name.clone();
        match taxon.rank.as_deref() {
            Some("phylum") => ladder.phylum = name,
            Some("class") => ladder.class = name,
            Some("order") => ladder.order = name,
            Some("family") => ladder.family = name,
            Some("tribe") => ladder.tribe = name,
            Some("genus") => ladder.genus = name,
            Some("species") => ladder.species = name,
            _ => {}
        }
    }
    ladder
}
