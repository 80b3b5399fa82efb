pub use mediator::DefaultAsyncMediator;
use std::sync::Arc;

use crate::ingest::ReadingStore;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(store: Arc<dyn ReadingStore>) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Readings
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move { crate::features::readings::commands::upload::handle(store, cmd).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { crate::features::readings::queries::list_readings::handle(store, query).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { crate::features::readings::queries::list_batches::handle(store, query).await }
            }
        })
        .build()
}
