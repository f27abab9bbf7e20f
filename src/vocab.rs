//! IRIs of the vocabularies the converter understands.

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
pub const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
pub const RDFS_SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";

pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
pub const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
pub const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
pub const OWL_CARDINALITY: &str = "http://www.w3.org/2002/07/owl#cardinality";
pub const OWL_MAX_CARDINALITY: &str = "http://www.w3.org/2002/07/owl#maxCardinality";
pub const OWL_MIN_CARDINALITY: &str = "http://www.w3.org/2002/07/owl#minCardinality";

pub const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
pub const SKOS_DEFINITION: &str = "http://www.w3.org/2004/02/skos/core#definition";

pub const DCTERMS_TITLE: &str = "http://purl.org/dc/terms/title";
pub const DCTERMS_DESCRIPTION: &str = "http://purl.org/dc/terms/description";
pub const DC_TITLE: &str = "http://purl.org/dc/elements/1.1/title";
pub const DC_DESCRIPTION: &str = "http://purl.org/dc/elements/1.1/description";

pub const SCHEMA: &str = "http://schema.org/";
pub const SCHEMA_IDENTIFIER: &str = "http://schema.org/identifier";

pub const OBO: &str = "http://purl.obolibrary.org/obo/";

/// Label predicates, in order of preference. All of them are consulted.
pub const LABEL_PREDICATES: [&str; 4] = [RDFS_LABEL, SKOS_PREF_LABEL, DCTERMS_TITLE, DC_TITLE];

/// Description predicates, in order of preference. All of them are consulted.
pub const DESCRIPTION_PREDICATES: [&str; 4] = [
    RDFS_COMMENT,
    SKOS_DEFINITION,
    DCTERMS_DESCRIPTION,
    DC_DESCRIPTION,
];

/// Predicates consumed while building the entity itself; they never become claims.
pub fn is_structural_predicate(iri: &str) -> bool {
    LABEL_PREDICATES.contains(&iri)
        || DESCRIPTION_PREDICATES.contains(&iri)
        || matches!(
            iri,
            RDF_TYPE | OWL_CARDINALITY | OWL_MAX_CARDINALITY | OWL_MIN_CARDINALITY
        )
}

/// Taxonomy predicates that are not modeled as statements yet.
pub fn is_unhandled_predicate(iri: &str) -> bool {
    matches!(iri, RDFS_DOMAIN | RDFS_RANGE)
}
