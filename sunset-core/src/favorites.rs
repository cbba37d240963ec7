use tokio::sync::RwLock;

use crate::error::CoordinatesError;
use crate::model::{Coordinates, Favorite};

/// In-memory list of saved sunset spots. Lost on restart.
#[derive(Debug)]
pub struct FavoritesStore {
    entries: RwLock<Vec<Favorite>>,
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new(vec![
            Favorite {
                location: "Malibu Beach".to_string(),
                latitude: 34.0259,
                longitude: -118.7798,
            },
            Favorite {
                location: "Grand Canyon".to_string(),
                latitude: 36.0544,
                longitude: -112.1401,
            },
        ])
    }
}

impl FavoritesStore {
    pub fn new(entries: Vec<Favorite>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub async fn list(&self) -> Vec<Favorite> {
        self.entries.read().await.clone()
    }

    pub async fn add(&self, favorite: Favorite) -> Result<Favorite, CoordinatesError> {
        Coordinates::new(favorite.latitude, favorite.longitude)?;
        self.entries.write().await.push(favorite.clone());
        tracing::info!("Added favorite: {}", favorite.location);
        Ok(favorite)
    }
}
