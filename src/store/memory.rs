// src/store/memory.rs

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    AdjustOutcome, ConditionalUpdate, Document, DocumentStore, Filter, Query, SortOrder,
    StoreError,
};

/// Motor em memória do adaptador de documentos.
///
/// Coleções nomeadas guardadas como mapas `id -> documento` atrás de um
/// único `RwLock`. Cada operação de escrita segura o lock de escrita do
/// começo ao fim, o que torna `set_fields_if` e `adjust` linearizáveis —
/// é isso que fecha as corridas de check-then-act nas transições de estado.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn doc_id(doc: &Document) -> Result<String, StoreError> {
    doc.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StoreError::MissingId)
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        // Campo numérico ainda não gravado conta como zero.
        Value::Null => Some(Decimal::ZERO),
        _ => None,
    }
}

fn decimal_to_value(value: Decimal) -> Value {
    if value.fract().is_zero() {
        if let Some(i) = value.to_i64() {
            return Value::from(i);
        }
    }
    Value::from(value.to_f64().unwrap_or(0.0))
}

fn apply_fields(doc: &mut Document, fields: serde_json::Map<String, Value>) {
    if let Some(obj) = doc.as_object_mut() {
        for (key, value) in fields {
            obj.insert(key, value);
        }
    }
}

fn compare_by(a: &Document, b: &Document, field: &str) -> Ordering {
    let left = a.get(field).unwrap_or(&Value::Null);
    let right = b.get(field).unwrap_or(&Value::Null);
    match (left, right) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        // Timestamps RFC 3339 ordenam corretamente como strings.
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        let id = doc_id(&doc)?;
        let mut collections = self.collections.write().await;
        let col = collections.entry(collection.to_string()).or_default();
        if col.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }
        col.insert(id, doc);
        Ok(())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|col| col.get(id))
            .cloned())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|col| col.values().find(|doc| filter.matches(doc)))
            .cloned())
    }

    async fn find(&self, collection: &str, query: Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|col| {
                col.values()
                    .filter(|doc| query.filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, order)) = &query.sort {
            docs.sort_by(|a, b| {
                let ord = compare_by(a, b, field);
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|col| col.values().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }

    async fn set_fields(
        &self,
        collection: &str,
        id: &str,
        fields: serde_json::Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|col| col.get_mut(id))
        else {
            return Ok(None);
        };
        apply_fields(doc, fields);
        Ok(Some(doc.clone()))
    }

    async fn set_fields_if(
        &self,
        collection: &str,
        id: &str,
        guard: &Filter,
        fields: serde_json::Map<String, Value>,
    ) -> Result<ConditionalUpdate, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|col| col.get_mut(id))
        else {
            return Ok(ConditionalUpdate::NotFound);
        };
        if !guard.matches(doc) {
            return Ok(ConditionalUpdate::Rejected(doc.clone()));
        }
        apply_fields(doc, fields);
        Ok(ConditionalUpdate::Updated(doc.clone()))
    }

    async fn adjust(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: Decimal,
        floor: Option<Decimal>,
    ) -> Result<AdjustOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|col| col.get_mut(id))
        else {
            return Ok(AdjustOutcome::NotFound);
        };

        let current = doc.get(field).unwrap_or(&Value::Null);
        let current = value_to_decimal(current)
            .ok_or_else(|| StoreError::NotNumeric(field.to_string()))?;
        let next = current + delta;
        if let Some(floor) = floor {
            if next < floor {
                return Ok(AdjustOutcome::Conflict(doc.clone()));
            }
        }
        if let Some(obj) = doc.as_object_mut() {
            obj.insert(field.to_string(), decimal_to_value(next));
        }
        Ok(AdjustOutcome::Updated(doc.clone()))
    }

    async fn adjust_or_insert(
        &self,
        collection: &str,
        filter: &Filter,
        field: &str,
        delta: Decimal,
        seed: Document,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let col = collections.entry(collection.to_string()).or_default();

        let existing_id = col
            .values()
            .find(|doc| filter.matches(doc))
            .map(|doc| doc_id(doc))
            .transpose()?;

        match existing_id {
            Some(id) => {
                let doc = col.get_mut(&id).expect("documento recém-localizado");
                let current = doc.get(field).unwrap_or(&Value::Null);
                let current = value_to_decimal(current)
                    .ok_or_else(|| StoreError::NotNumeric(field.to_string()))?;
                let next = current + delta;
                if let Some(obj) = doc.as_object_mut() {
                    obj.insert(field.to_string(), decimal_to_value(next));
                }
                Ok(doc.clone())
            }
            None => {
                let id = doc_id(&seed)?;
                col.insert(id, seed.clone());
                Ok(seed)
            }
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .and_then(|col| col.remove(id))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new()
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = store();
        store
            .insert("products", json!({"id": "p1", "stock": 10}))
            .await
            .unwrap();
        let err = store
            .insert("products", json!({"id": "p1", "stock": 3}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[tokio::test]
    async fn adjust_respects_the_floor() {
        let store = store();
        store
            .insert("products", json!({"id": "p1", "stock": 5}))
            .await
            .unwrap();

        // Decremento dentro do saldo: passa.
        let out = store
            .adjust("products", "p1", "stock", Decimal::from(-3), Some(Decimal::ZERO))
            .await
            .unwrap();
        assert!(matches!(out, AdjustOutcome::Updated(_)));

        // Decremento que cruzaria o piso: recusado, saldo intacto.
        let out = store
            .adjust("products", "p1", "stock", Decimal::from(-3), Some(Decimal::ZERO))
            .await
            .unwrap();
        assert!(matches!(out, AdjustOutcome::Conflict(_)));

        let doc = store.find_by_id("products", "p1").await.unwrap().unwrap();
        assert_eq!(doc["stock"], json!(2));
    }

    #[tokio::test]
    async fn set_fields_if_is_a_fetch_and_set() {
        let store = store();
        store
            .insert("purchases", json!({"id": "c1", "status": "pending"}))
            .await
            .unwrap();

        let guard = Filter::new().eq("status", "pending");
        let mut fields = serde_json::Map::new();
        fields.insert("status".into(), json!("received"));

        let first = store
            .set_fields_if("purchases", "c1", &guard, fields.clone())
            .await
            .unwrap();
        assert!(matches!(first, ConditionalUpdate::Updated(_)));

        // Segunda tentativa encontra o guard violado e devolve o documento
        // atual para o chamador classificar o erro.
        let second = store
            .set_fields_if("purchases", "c1", &guard, fields)
            .await
            .unwrap();
        match second {
            ConditionalUpdate::Rejected(doc) => assert_eq!(doc["status"], json!("received")),
            other => panic!("esperava Rejected, veio {other:?}"),
        }
    }

    #[tokio::test]
    async fn adjust_or_insert_creates_then_increments() {
        let store = store();
        let filter = Filter::new().eq("productId", "p1").eq("warehouseId", "w1");

        let seed = json!({"id": "s1", "productId": "p1", "warehouseId": "w1", "quantity": 4});
        let row = store
            .adjust_or_insert("product_stock", &filter, "quantity", Decimal::from(4), seed)
            .await
            .unwrap();
        assert_eq!(row["quantity"], json!(4));

        let seed2 = json!({"id": "s2", "productId": "p1", "warehouseId": "w1", "quantity": 6});
        let row = store
            .adjust_or_insert("product_stock", &filter, "quantity", Decimal::from(6), seed2)
            .await
            .unwrap();
        // Mesma linha (p1, w1), nada de segunda inserção.
        assert_eq!(row["id"], json!("s1"));
        assert_eq!(row["quantity"], json!(10));
    }

    #[tokio::test]
    async fn find_sorts_and_limits() {
        let store = store();
        for (id, date) in [("a", "2026-01-02T00:00:00Z"), ("b", "2026-01-03T00:00:00Z"), ("c", "2026-01-01T00:00:00Z")] {
            store
                .insert("sales", json!({"id": id, "date": date}))
                .await
                .unwrap();
        }
        let docs = store
            .find(
                "sales",
                Query::all().sort("date", SortOrder::Desc).limit(2),
            )
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
