//! In-process change notifications, fanned out to Server-Sent Event streams.

use axum::response::sse::Event;
use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::recipe::Recipe;
use crate::ratings::RatingSummary;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipeEvent {
    RecipeCreated {
        recipe_id: Uuid,
        title: String,
    },
    RatingChanged {
        recipe_id: Uuid,
        avg_rating: f64,
        rating_count: i32,
    },
    RecipeDeleted {
        recipe_id: Uuid,
    },
}

impl RecipeEvent {
    pub fn created(recipe: &Recipe) -> Self {
        RecipeEvent::RecipeCreated {
            recipe_id: recipe.id,
            title: recipe.title.clone(),
        }
    }

    pub fn rating(recipe_id: Uuid, summary: RatingSummary) -> Self {
        RecipeEvent::RatingChanged {
            recipe_id,
            avg_rating: summary.avg_rating,
            rating_count: summary.rating_count,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecipeEvent::RecipeCreated { .. } => "recipe_created",
            RecipeEvent::RatingChanged { .. } => "rating_changed",
            RecipeEvent::RecipeDeleted { .. } => "recipe_deleted",
        }
    }

    pub fn recipe_id(&self) -> Uuid {
        match self {
            RecipeEvent::RecipeCreated { recipe_id, .. }
            | RecipeEvent::RatingChanged { recipe_id, .. }
            | RecipeEvent::RecipeDeleted { recipe_id } => *recipe_id,
        }
    }

    pub fn to_sse(&self) -> Result<Event, axum::Error> {
        Event::default().event(self.name()).json_data(self)
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RecipeEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: RecipeEvent) {
        if self.tx.send(event).is_err() {
            debug!("No event subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecipeEvent> {
        self.tx.subscribe()
    }
}

/// Turns a receiver into a stream of the events `keep` accepts. Lagging
/// subscribers skip what they missed; the stream ends when the bus closes.
pub fn filtered<F>(
    rx: broadcast::Receiver<RecipeEvent>,
    keep: F,
) -> impl Stream<Item = RecipeEvent> + Send + 'static
where
    F: Fn(&RecipeEvent) -> bool + Send + 'static,
{
    stream::unfold((rx, keep), |(mut rx, keep)| async move {
        loop {
            match rx.recv().await {
                Ok(event) if keep(&event) => return Some((event, (rx, keep))),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, skipped {skipped} events");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_filtered_stream_skips_other_recipes() {
        let bus = EventBus::new();
        let wanted = Uuid::new_v4();
        let stream = filtered(bus.subscribe(), move |e| e.recipe_id() == wanted);
        futures_util::pin_mut!(stream);

        bus.publish(RecipeEvent::RecipeDeleted {
            recipe_id: Uuid::new_v4(),
        });
        bus.publish(RecipeEvent::rating(wanted, RatingSummary::new(4.0, 1)));

        let event = stream.next().await.unwrap();
        assert_eq!(event.name(), "rating_changed");
        assert_eq!(event.recipe_id(), wanted);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(RecipeEvent::RecipeDeleted {
            recipe_id: Uuid::new_v4(),
        });
    }

    #[test]
    fn test_event_json_shape() {
        let id = Uuid::nil();
        let json = serde_json::to_value(RecipeEvent::rating(id, RatingSummary::new(3.5, 2))).unwrap();
        assert_eq!(json["type"], "rating_changed");
        assert_eq!(json["rating_count"], 2);
    }
}
