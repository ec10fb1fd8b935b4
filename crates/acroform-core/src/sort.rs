//! Reading-order sorting of field descriptors.
//!
//! Order is page ascending, then top-to-bottom, then left-to-right.
//! Fields whose bottom edges are closer than a tolerance share a line.
//! Lines are formed per page by anchoring on the highest remaining Y, so
//! every field gets a fixed line index and the comparison is a total
//! order: sorting is stable and re-sorting a sorted list changes nothing.
//! Fields without a position go last, in their existing order.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::FieldDescriptor;

/// Assign a line index to each Y value, top line first.
///
/// Values are visited from highest to lowest; a value starts a new line
/// when it is `tolerance` or more below the current line's anchor.
pub fn line_bands(ys: &[f64], tolerance: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ys.len()).collect();
    order.sort_by(|&a, &b| ys[b].total_cmp(&ys[a]));

    let mut bands = vec![0; ys.len()];
    let mut band = 0;
    let mut anchor: Option<f64> = None;
    for idx in order {
        let y = ys[idx];
        match anchor {
            Some(a) if a - y < tolerance => {}
            Some(_) => {
                band += 1;
                anchor = Some(y);
            }
            None => anchor = Some(y),
        }
        bands[idx] = band;
    }
    bands
}

#[derive(Debug, Clone, Copy)]
struct SortKey {
    page: u32,
    band: usize,
    x: f64,
}

fn compare_keys(a: Option<&SortKey>, b: Option<&SortKey>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a
            .page
            .cmp(&b.page)
            .then(a.band.cmp(&b.band))
            .then(a.x.total_cmp(&b.x)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_keys(fields: &[FieldDescriptor], tolerance: f64) -> Vec<Option<SortKey>> {
    let mut by_page: HashMap<u32, Vec<usize>> = HashMap::new();
    for (i, field) in fields.iter().enumerate() {
        if let Some(page) = field.page() {
            by_page.entry(page).or_default().push(i);
        }
    }

    let mut keys: Vec<Option<SortKey>> = vec![None; fields.len()];
    for (page, indices) in by_page {
        let ys: Vec<f64> = indices
            .iter()
            .map(|&i| fields[i].position.as_ref().map_or(0.0, |p| p.rect[1]))
            .collect();
        let bands = line_bands(&ys, tolerance);
        for (&i, band) in indices.iter().zip(bands) {
            let x = fields[i].position.as_ref().map_or(0.0, |p| p.rect[0]);
            keys[i] = Some(SortKey { page, band, x });
        }
    }
    keys
}

/// Sort fields into reading order in place.
pub fn sort_reading_order(fields: &mut Vec<FieldDescriptor>, line_tolerance: f64) {
    let keys = sort_keys(fields, line_tolerance);
    let mut keyed: Vec<(Option<SortKey>, FieldDescriptor)> =
        keys.into_iter().zip(fields.drain(..)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref()));
    fields.extend(keyed.into_iter().map(|(_, field)| field));
}

/// Whether `fields` is already in reading order.
pub fn is_reading_order(fields: &[FieldDescriptor], line_tolerance: f64) -> bool {
    let keys = sort_keys(fields, line_tolerance);
    keys.windows(2)
        .all(|w| compare_keys(w[0].as_ref(), w[1].as_ref()) != Ordering::Greater)
}
