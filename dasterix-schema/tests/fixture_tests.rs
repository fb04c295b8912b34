//! Loader tests over the workspace category fixtures.

use dasterix_core::diag::SchemaError;
use dasterix_core::schema::{ItemLayout, Rule, UapSlot};
use dasterix_schema::{LoadError, load_category};
use test_utils::load_fixture;

#[test]
fn cat048_fixture_loads() {
    let schema = load_category(&load_fixture("valid", "cat048.xml")).unwrap();

    assert_eq!(schema.category, 48);
    assert_eq!(schema.edition, "1.31");
    assert_eq!(schema.uaps.len(), 1);
    assert_eq!(schema.uaps[0].slots.len(), 21);

    let dsi = schema.item_by_id("010").unwrap();
    assert_eq!(dsi.rule, Rule::Mandatory);

    assert!(matches!(
        schema.item_by_id("020").unwrap().layout,
        ItemLayout::Variable(_)
    ));
    assert!(matches!(
        schema.item_by_id("130").unwrap().layout,
        ItemLayout::Compound(_)
    ));
    assert!(matches!(
        schema.item_by_id("250").unwrap().layout,
        ItemLayout::Repetitive(_)
    ));
    assert!(matches!(schema.item_by_id("SP").unwrap().layout, ItemLayout::Explicit));

    // FRN 15..19 are spare in the 1.31 profile subset.
    assert!(matches!(schema.uaps[0].slots[14], UapSlot::Spare));
    assert!(matches!(schema.uaps[0].slots[19], UapSlot::Item(_)));

    // BDS catalog carries registers 4,0 and 6,0.
    assert!(schema.bds_layout(0x40).is_some());
    assert!(schema.bds_layout(0x60).is_some());
    assert!(schema.bds_layout(0x50).is_none());
}

#[test]
fn cat048_compound_subitems_resolve() {
    let schema = load_category(&load_fixture("valid", "cat048.xml")).unwrap();

    let ItemLayout::Compound(comp) = &schema.item_by_id("130").unwrap().layout else {
        panic!("expected compound layout for 130");
    };
    assert_eq!(comp.slots.len(), 7);

    let ids: Vec<_> = comp
        .slots
        .iter()
        .map(|slot| schema.item(slot.unwrap()).unwrap().id.as_str())
        .collect();
    assert_eq!(ids, vec!["SRL", "SRR", "SAM", "PRL", "PAM", "RPD", "APD"]);
}

#[test]
fn cat034_fixture_loads() {
    let schema = load_category(&load_fixture("valid", "cat034.xml")).unwrap();

    assert_eq!(schema.category, 34);
    assert_eq!(schema.item_by_id("000").unwrap().rule, Rule::Mandatory);

    let ItemLayout::Compound(comp) = &schema.item_by_id("050").unwrap().layout else {
        panic!("expected compound layout for 050");
    };
    // COM, two spares, PSR, SSR.
    assert_eq!(comp.slots.len(), 5);
    assert!(comp.slots[1].is_none());
    assert!(comp.slots[2].is_none());
}

#[test]
fn cat001_fixture_has_two_uaps_and_selector() {
    let schema = load_category(&load_fixture("valid", "cat001.xml")).unwrap();

    assert_eq!(schema.uaps.len(), 2);
    assert_eq!(schema.uaps[0].name, "plot");
    assert_eq!(schema.uaps[1].name, "track");

    let sel = schema.selector.as_ref().unwrap();
    assert_eq!(sel.offset, 3);
    assert_eq!((sel.from, sel.to), (8, 8));
    assert_eq!(sel.fallback, 0);
    assert_eq!(sel.cases, vec![(0, 0), (1, 1)]);
}

#[test]
fn loading_is_deterministic() {
    let xml = load_fixture("valid", "cat048.xml");
    assert_eq!(load_category(&xml).unwrap(), load_category(&xml).unwrap());
}

fn schema_error(name: &str) -> SchemaError {
    match load_category(&load_fixture("invalid", name)) {
        Err(LoadError::Schema(err)) => err,
        other => panic!("expected schema error from {name}, got {other:?}"),
    }
}

#[test]
fn invalid_fixtures_are_rejected() {
    assert!(matches!(
        schema_error("coverage.xml"),
        SchemaError::CoverageMismatch { .. }
    ));
    assert!(matches!(
        schema_error("duplicate_item.xml"),
        SchemaError::DuplicateItem { .. }
    ));
    assert!(matches!(
        schema_error("unknown_uap.xml"),
        SchemaError::UnknownUapItem { frn: 2, .. }
    ));
    assert!(matches!(
        schema_error("fx_claimed.xml"),
        SchemaError::FxBitClaimed { .. }
    ));
    assert!(matches!(
        schema_error("overlap.xml"),
        SchemaError::OverlappingFields { .. }
    ));
    assert!(matches!(
        schema_error("bad_selector.xml"),
        SchemaError::UnknownSelectorUap { .. }
    ));
}
