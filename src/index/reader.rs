use bson::Document;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::store::IndexSource;

type Result<T> = std::result::Result<T, Error>;

/// Every index descriptor of the source, in the order the server lists them.
pub async fn list_all<S>(source: &S) -> Result<Vec<Document>>
where
    S: IndexSource + ?Sized,
{
    let descriptors = source.list_indexes().await?;
    log::debug!("Source reported {} indexes", descriptors.len());
    Ok(descriptors)
}

/// Descriptors whose name is in `names`; fails unless every name is found.
pub async fn list_filtered<S>(source: &S, names: &BTreeSet<String>) -> Result<Vec<Document>>
where
    S: IndexSource + ?Sized,
{
    let descriptors: Vec<Document> = list_all(source)
        .await?
        .into_iter()
        .filter(|descriptor| {
            descriptor
                .get_str("name")
                .map_or(false, |name| names.contains(name))
        })
        .collect();

    let found: BTreeSet<&str> = descriptors
        .iter()
        .filter_map(|descriptor| descriptor.get_str("name").ok())
        .collect();
    let missing: Vec<String> = names
        .iter()
        .filter(|name| !found.contains(name.as_str()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        log::debug!("Missing indexes in source: {:?}", missing);
        return Err(Error::MissingIndexes(missing));
    }

    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;
    use bson::doc;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn source() -> FakeSource {
        FakeSource::with(vec![
            doc! { "v": 2, "key": { "_id": 1 }, "name": "_id_" },
            doc! { "v": 2, "key": { "sku": 1 }, "name": "sku_1", "unique": true },
            doc! { "v": 2, "key": { "qty": -1 }, "name": "qty_-1" },
        ])
    }

    #[tokio::test]
    async fn list_all_keeps_native_order() {
        let listed = list_all(&source()).await.unwrap();
        let listed: Vec<&str> = listed.iter().map(|d| d.get_str("name").unwrap()).collect();
        assert_eq!(listed, vec!["_id_", "sku_1", "qty_-1"]);
    }

    #[tokio::test]
    async fn list_all_surfaces_store_failure() {
        let result = list_all(&FakeSource::failing()).await;
        assert!(matches!(result, Err(Error::StoreAccess(_))));
    }

    #[tokio::test]
    async fn filter_keeps_requested_only() {
        let listed = list_filtered(&source(), &names(&["qty_-1", "_id_"]))
            .await
            .unwrap();
        let listed: Vec<&str> = listed.iter().map(|d| d.get_str("name").unwrap()).collect();
        assert_eq!(listed, vec!["_id_", "qty_-1"]);
    }

    #[tokio::test]
    async fn filter_reports_every_missing_name() {
        let result = list_filtered(&source(), &names(&["sku_1", "price_1", "a_1"])).await;
        match result {
            Err(Error::MissingIndexes(missing)) => assert_eq!(missing, vec!["a_1", "price_1"]),
            other => panic!("expected missing indexes, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn nameless_descriptors_never_match() {
        let source = FakeSource::with(vec![Document::new()]);
        let result = list_filtered(&source, &names(&["non_existing_index"])).await;
        assert!(matches!(result, Err(Error::MissingIndexes(_))));
    }
}
