mod gql_ops;
pub mod server;

pub use server::{AppSchema, ContextData, GraphQLServer, QueryDefaults, build_schema};
