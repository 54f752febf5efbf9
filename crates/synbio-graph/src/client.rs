//! Neo4j connection management and the Neo4j-backed graph store.

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Neo4jClientErrorKind, Neo4jErrorKind, Query, Txn};

use synbio_core::{Properties, RelationType};

use crate::cypher;
use crate::store::{GraphStore, NodeHandle, StoreError, StoreTxn};

/// Errors from direct graph client operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "synbio-dev".to_string(),
            max_connections: 16,
            fetch_size: 256,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc). Pooled connections are released when the
/// last clone is dropped.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a write-only query outside the writer's transactions.
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a read query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a read query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        Ok(stream.next().await?)
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    type Txn = Neo4jTxn;

    async fn begin(&self) -> Result<Neo4jTxn, StoreError> {
        let txn = self.graph.start_txn().await.map_err(store_error)?;
        Ok(Neo4jTxn { txn })
    }
}

/// A Neo4j write transaction. Dropped without commit, the server rolls it
/// back when the connection returns to the pool.
pub struct Neo4jTxn {
    txn: Txn,
}

impl Neo4jTxn {
    /// Run a statement and drain its result stream, keeping the rows.
    async fn fetch(&mut self, query: Query) -> Result<Vec<neo4rs::Row>, StoreError> {
        let mut stream = self.txn.execute(query).await.map_err(store_error)?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next(self.txn.handle()).await.map_err(store_error)? {
            rows.push(row);
        }
        Ok(rows)
    }
}

#[async_trait]
impl StoreTxn for Neo4jTxn {
    async fn merge_node(
        &mut self,
        label: &str,
        properties: &Properties,
    ) -> Result<NodeHandle, StoreError> {
        let matched = self
            .fetch(cypher::match_node(label, properties).to_query())
            .await?;

        let row = match matched.len() {
            0 => self
                .fetch(cypher::create_node(label, properties).to_query())
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| StoreError::Rejected(format!("CREATE on {label} returned no node")))?,
            1 => matched
                .into_iter()
                .next()
                .ok_or_else(|| StoreError::Rejected(format!("MATCH on {label} returned no node")))?,
            n => {
                return Err(StoreError::Rejected(format!(
                    "{n} {label} nodes share the same property set"
                )))
            }
        };

        let handle: String = row
            .get("handle")
            .map_err(|e| StoreError::Rejected(format!("Failed to read node handle: {e}")))?;

        Ok(NodeHandle(handle))
    }

    async fn merge_edge(
        &mut self,
        parent: &NodeHandle,
        child: &NodeHandle,
        relation: &RelationType,
        index: i64,
    ) -> Result<(), StoreError> {
        let stmt = cypher::merge_edge(parent, child, relation, index);
        let rows = self.fetch(stmt.to_query()).await?;

        let merged = rows
            .first()
            .and_then(|row| row.get::<i64>("merged").ok())
            .unwrap_or(0);
        if merged == 0 {
            return Err(StoreError::Rejected(format!(
                "MERGE of {relation} edge {parent} -> {child} matched no nodes"
            )));
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_error)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(store_error)
    }
}

/// Classify a driver error by its cause: transport, auth and session
/// failures mean the store is unreachable; everything the server answered
/// with is a rejection of the transaction.
fn store_error(e: neo4rs::Error) -> StoreError {
    let unreachable = match &e {
        neo4rs::Error::Neo4j(server) => server_unreachable(server.kind()),
        neo4rs::Error::IOError { .. }
        | neo4rs::Error::ConnectionError
        | neo4rs::Error::AuthenticationError(_)
        | neo4rs::Error::UrlParseError(_)
        | neo4rs::Error::UnsupportedScheme(_)
        | neo4rs::Error::InvalidDnsName(_)
        | neo4rs::Error::InvalidConfig
        | neo4rs::Error::UnsupportedVersion(_) => true,
        _ => false,
    };

    if unreachable {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Rejected(e.to_string())
    }
}

fn server_unreachable(kind: Neo4jErrorKind) -> bool {
    matches!(
        kind,
        Neo4jErrorKind::Client(
            Neo4jClientErrorKind::Security(_)
                | Neo4jClientErrorKind::SessionExpired
                | Neo4jClientErrorKind::FatalDiscovery
        )
    )
}
