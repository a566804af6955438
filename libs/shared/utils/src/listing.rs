//! Client-side filtering and pagination of lists that were already fetched.

use shared_models::pagination::{Page, Pagination};

/// Keeps items where any of the searchable fields contains `query` (case-insensitive).
/// A blank query keeps everything.
pub fn filter_items<T, F>(items: &[T], query: &str, fields: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Vec<String>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }

    items
        .iter()
        .filter(|item| {
            fields(item)
                .iter()
                .any(|value| value.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Cuts page `page` (1-based) of size `limit` out of `items`.
pub fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Page<T> {
    let pagination = Pagination::new(page, limit, items.len() as u64);
    let start = ((pagination.page - 1) as usize).saturating_mul(pagination.limit as usize);
    let slice = items
        .iter()
        .skip(start)
        .take(pagination.limit as usize)
        .cloned()
        .collect();

    Page {
        items: slice,
        pagination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        name: String,
        nik: String,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Budi Santoso".into(), nik: "3201000000000001".into() },
            Row { name: "Siti Aminah".into(), nik: "3201000000000002".into() },
            Row { name: "Agus Budiman".into(), nik: "3171000000000003".into() },
        ]
    }

    #[test]
    fn test_filter_matches_any_field_ignoring_case() {
        let found = filter_items(&rows(), "BUDI", |r| vec![r.name.clone(), r.nik.clone()]);
        assert_eq!(found.len(), 2);

        let by_nik = filter_items(&rows(), "3171", |r| vec![r.name.clone(), r.nik.clone()]);
        assert_eq!(by_nik[0].name, "Agus Budiman");

        assert_eq!(filter_items(&rows(), "  ", |r| vec![r.name.clone()]).len(), 3);
    }

    #[test]
    fn test_paginate_last_page_is_partial() {
        let page = paginate(&rows(), 2, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination.total_pages, 2);

        let beyond = paginate(&rows(), 5, 2);
        assert!(beyond.items.is_empty());
    }
}
