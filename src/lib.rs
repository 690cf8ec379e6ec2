// src/lib.rs
//
// Back office de estoque e ponto de venda: produtos, clientes, vendas,
// orçamentos, compras e estoque multi-depósito sobre um armazenamento de
// documentos, com permissões por papel e trilha de auditoria.

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod services;
pub mod store;
