// src/store/mod.rs
//
// O Adaptador de Armazenamento de Documentos: operações genéricas de
// get/find/insert/update/delete contra coleções nomeadas. Nenhuma regra de
// negócio vive aqui — os serviços decidem O QUE gravar, o adaptador garante
// COMO gravar (incluindo as escritas condicionais de que as transições
// de estado dependem).

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

/// Um documento é sempre um objeto JSON com um campo `id` (string).
pub type Document = Value;

/// Nomes das coleções conhecidas pelo sistema.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    pub const CUSTOMERS: &str = "customers";
    pub const SALES: &str = "sales";
    pub const QUOTES: &str = "quotes";
    pub const AUDIT_LOGS: &str = "audit_logs";
    pub const WAREHOUSES: &str = "warehouses";
    pub const SUPPLIERS: &str = "suppliers";
    pub const SUPPLIER_PRICES: &str = "supplier_prices";
    pub const PURCHASES: &str = "purchases";
    pub const PRODUCT_STOCK: &str = "product_stock";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("documento duplicado na coleção '{collection}': id '{id}'")]
    DuplicateId { collection: String, id: String },

    #[error("documento inserido sem campo 'id'")]
    MissingId,

    #[error("campo '{0}' não é numérico")]
    NotNumeric(String),
}

/// Condição aplicada a um campo de um documento.
#[derive(Debug, Clone)]
enum Cond {
    Eq(Value),
    Ne(Value),
    Contains(String),
}

/// Filtro conjuntivo (todas as condições precisam valer).
/// Campos ausentes são tratados como `null`.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conds: Vec<(String, Cond)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conds.push((field.to_string(), Cond::Eq(value.into())));
        self
    }

    pub fn ne(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conds.push((field.to_string(), Cond::Ne(value.into())));
        self
    }

    /// Substring, sem diferenciar maiúsculas/minúsculas (busca de produtos).
    pub fn contains(mut self, field: &str, needle: &str) -> Self {
        self.conds
            .push((field.to_string(), Cond::Contains(needle.to_lowercase())));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conds.iter().all(|(field, cond)| {
            let actual = doc.get(field).unwrap_or(&Value::Null);
            match cond {
                Cond::Eq(expected) => actual == expected,
                Cond::Ne(expected) => actual != expected,
                Cond::Contains(needle) => actual
                    .as_str()
                    .map(|s| s.to_lowercase().contains(needle))
                    .unwrap_or(false),
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Filtro + ordenação + limite, o suficiente para as listagens do sistema.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Resultado de um fetch-and-set condicional.
/// `Rejected` carrega o documento atual para o chamador classificar a falha
/// (já anulado? já convertido? já recebido?).
#[derive(Debug)]
pub enum ConditionalUpdate {
    Updated(Document),
    Rejected(Document),
    NotFound,
}

/// Resultado de um incremento numérico atômico com piso.
/// `Conflict` é o compare-and-swap recusado: o decremento cruzaria o piso.
#[derive(Debug)]
pub enum AdjustOutcome {
    Updated(Document),
    Conflict(Document),
    NotFound,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insere um documento novo. Falha se o `id` já existir na coleção.
    async fn insert(&self, collection: &str, doc: Document) -> Result<(), StoreError>;

    async fn find_by_id(&self, collection: &str, id: &str)
        -> Result<Option<Document>, StoreError>;

    async fn find_one(&self, collection: &str, filter: &Filter)
        -> Result<Option<Document>, StoreError>;

    async fn find(&self, collection: &str, query: Query) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Atualização parcial (conjunto de campos). Devolve o documento
    /// atualizado, ou `None` se não existir.
    async fn set_fields(
        &self,
        collection: &str,
        id: &str,
        fields: serde_json::Map<String, Value>,
    ) -> Result<Option<Document>, StoreError>;

    /// Fetch-and-set em um único passo atômico: aplica `fields` somente se o
    /// documento atual satisfizer `guard`.
    async fn set_fields_if(
        &self,
        collection: &str,
        id: &str,
        guard: &Filter,
        fields: serde_json::Map<String, Value>,
    ) -> Result<ConditionalUpdate, StoreError>;

    /// Incremento numérico atômico. Com `floor`, recusa a escrita que
    /// deixaria o campo abaixo do piso (ex.: estoque negativo).
    async fn adjust(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: Decimal,
        floor: Option<Decimal>,
    ) -> Result<AdjustOutcome, StoreError>;

    /// Variante upsert do incremento: se nenhum documento satisfizer o
    /// filtro, insere `seed` (que já deve trazer o campo com o valor
    /// inicial). Usada para as linhas de estoque por depósito.
    async fn adjust_or_insert(
        &self,
        collection: &str,
        filter: &Filter,
        field: &str,
        delta: Decimal,
        seed: Document,
    ) -> Result<Document, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;
}
