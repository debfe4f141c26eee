use std::{net::SocketAddr, sync::Arc};

use async_graphql::{EmptySubscription, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Extension, Router,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use drive_common::{error::Error, state::DatabaseTrait};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::cors::Any;
use tracing::{error, info};

use crate::gql_ops::ledger::{MutationRoot, QueryRoot};

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Parameters used by alert queries when the caller leaves them out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryDefaults {
    pub stuck_multiplier: f64,
    pub volume_factor: f64,
    pub stale_threshold_factor: f64,
    /// Expected pipeline duration for runs created without one.
    pub default_pipeline_expected_secs: Option<i64>,
    pub x_time_back_secs: i64,
    pub granularity_secs: i64,
    pub max_records: u64,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            stuck_multiplier: 3.0,
            volume_factor: 2.0,
            stale_threshold_factor: 3.0,
            default_pipeline_expected_secs: None,
            x_time_back_secs: 0,
            granularity_secs: 15 * 60,
            max_records: 100,
        }
    }
}

pub struct ContextData {
    pub db: Arc<dyn DatabaseTrait>,
    pub defaults: QueryDefaults,
}

pub fn build_schema(ctx_data: ContextData) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(ctx_data)
        .finish()
}

pub struct GraphQLServer {
    db: Arc<dyn DatabaseTrait>,
    defaults: QueryDefaults,
    listen_addr: SocketAddr,
}

impl GraphQLServer {
    pub fn new(
        db: Arc<dyn DatabaseTrait>,
        defaults: QueryDefaults,
        listen_addr: &str,
    ) -> Result<Self, Error> {
        let listen_addr: SocketAddr = listen_addr.parse().map_err(|e| {
            Error::Config(format!(
                "Failed to parse listen address for GraphQL server: {}",
                e
            ))
        })?;

        Ok(Self {
            db,
            defaults,
            listen_addr,
        })
    }

    pub async fn serve(&self) -> Result<JoinHandle<()>, Error> {
        let ctx_data = ContextData {
            db: Arc::clone(&self.db),
            defaults: self.defaults,
        };

        let listen_addr = self.listen_addr;

        // bind before spawning so address errors reach the caller
        let listener = TcpListener::bind(listen_addr).await.map_err(|e| {
            Error::Config(format!("Failed to bind GraphQL listener on {listen_addr}: {e}"))
        })?;

        let handle = tokio::spawn(async move {
            let schema = build_schema(ctx_data);

            let cors = tower_http::cors::CorsLayer::new()
                .allow_methods(Any)
                .allow_origin(Any)
                .allow_headers(Any);

            let app = Router::new()
                .route("/", post(Self::graphql_handler))
                .route("/playground", get(Self::graphiql_playground))
                .layer(Extension(schema))
                .layer(cors);

            info!("GraphiQL playground available at http://{}/playground", listen_addr);

            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                error!("GraphQL server encountered an error: {}", e);
            } else {
                info!("GraphQL server stopped gracefully.");
            }
        });

        Ok(handle)
    }

    async fn graphql_handler(
        schema: axum::Extension<AppSchema>,
        req: GraphQLRequest,
    ) -> GraphQLResponse {
        schema.execute(req.into_inner()).await.into()
    }

    async fn graphiql_playground() -> impl IntoResponse {
        Html(
            r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Drive Ledger GraphiQL</title>
    <style>
        body { height: 100vh; margin: 0; overflow: hidden; }
        #graphiql { height: 100%; }
    </style>
    <script crossorigin src="https://unpkg.com/react@18/umd/react.development.js"></script>
    <script crossorigin src="https://unpkg.com/react-dom@18/umd/react-dom.development.js"></script>
    <link rel="stylesheet" href="https://unpkg.com/graphiql/graphiql.min.css" />
</head>
<body>
    <div id="graphiql">Loading...</div>

    <script src="https://unpkg.com/graphiql/graphiql.min.js"></script>

    <script>
        function graphQLFetcher(graphQLParams) {
            return fetch('/', {
                method: 'post',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(graphQLParams),
            }).then(response => response.json());
        }

        ReactDOM.render(
            React.createElement(GraphiQL, { fetcher: graphQLFetcher }),
            document.getElementById('graphiql'),
        );
    </script>
</body>
</html>
        "#,
        )
    }
}
