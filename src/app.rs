use crate::analyzer::{self, AnalysisService};
use crate::config::Config;
use crate::connectivity::Connectivity;
use crate::draft::DraftManager;
use crate::error::Result;
use crate::scanner::{DataUrlReader, ImageReader};
use crate::status::StatusSink;
use crate::store::Store;
use crate::submit::Submitter;
use crate::sync::QueueSynchronizer;
use std::sync::Arc;

/// ストアを共有する各コンポーネントの組み立て
pub struct App {
    pub store: Arc<Store>,
    pub connectivity: Connectivity,
    pub drafts: DraftManager,
    pub submitter: Submitter,
    pub synchronizer: Arc<QueueSynchronizer>,
}

impl App {
    pub async fn open(config: &Config, online: bool, sink: Arc<dyn StatusSink>) -> Result<Self> {
        let store = Arc::new(Store::open(&config.data_dir()?).await?);
        let analyzer = analyzer::from_config(config)?;
        Ok(Self::with_parts(
            store,
            analyzer,
            Arc::new(DataUrlReader),
            Connectivity::new(online),
            sink,
        ))
    }

    pub fn with_parts(
        store: Arc<Store>,
        analyzer: Arc<dyn AnalysisService>,
        reader: Arc<dyn ImageReader>,
        connectivity: Connectivity,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            drafts: DraftManager::new(store.clone(), reader),
            submitter: Submitter::new(store.clone(), analyzer.clone(), connectivity.clone()),
            synchronizer: Arc::new(QueueSynchronizer::new(
                store.clone(),
                analyzer,
                connectivity.clone(),
                sink,
            )),
            store,
            connectivity,
        }
    }
}
