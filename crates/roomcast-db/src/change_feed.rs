//! Change feed over the `rooms` collection.
//!
//! [`ChangeFeed`] is a boxed stream of [`RoomChange`] events in the order
//! the store reports them. The `MongoDB` backend maps change-stream events;
//! the in-memory backend relays the events it emits on its own writes.

use futures::stream::{BoxStream, StreamExt};
use mongodb::bson::{Bson, Document};
use mongodb::change_stream::event::{ChangeStreamEvent, OperationType};
use roomcast_types::{ChangeKind, RoomChange, TruncatedArray, UpdateDescription};
use tokio::sync::broadcast;

use crate::documents::room_id_of;
use crate::error::DbError;

/// Stream of mutation events on the rooms collection.
pub type ChangeFeed = BoxStream<'static, Result<RoomChange, DbError>>;

/// Translate a driver change-stream event into a [`RoomChange`].
pub fn from_stream_event(event: ChangeStreamEvent<Document>) -> RoomChange {
    let kind = kind_of(event.operation_type);

    let room_id = event
        .document_key
        .as_ref()
        .and_then(|key| key.get_object_id("_id").ok())
        .map(room_id_of);

    let update = event.update_description.map(|desc| UpdateDescription {
        updated_fields: Bson::Document(desc.updated_fields).into_relaxed_extjson(),
        removed_fields: desc.removed_fields,
        truncated_arrays: desc
            .truncated_arrays
            .unwrap_or_default()
            .into_iter()
            .map(|t| TruncatedArray {
                field: t.field,
                new_size: t.new_size,
            })
            .collect(),
    });

    RoomChange {
        kind,
        room_id,
        update,
    }
}

/// Map the driver's operation type, keeping the server's name for kinds
/// the notifier does not act on.
fn kind_of(operation: OperationType) -> ChangeKind {
    match operation {
        OperationType::Insert => ChangeKind::Insert,
        OperationType::Update => ChangeKind::Update,
        OperationType::Replace => ChangeKind::Replace,
        OperationType::Delete => ChangeKind::Delete,
        OperationType::Drop => ChangeKind::Other(String::from("drop")),
        OperationType::Rename => ChangeKind::Other(String::from("rename")),
        OperationType::DropDatabase => ChangeKind::Other(String::from("dropDatabase")),
        OperationType::Invalidate => ChangeKind::Other(String::from("invalidate")),
        OperationType::Other(name) => ChangeKind::Other(name),
        // Newer driver variants fall back to their serialized name.
        other => ChangeKind::Other(
            mongodb::bson::to_bson(&other)
                .ok()
                .and_then(|name| name.as_str().map(str::to_owned))
                .unwrap_or_else(|| String::from("unknown")),
        ),
    }
}

/// Adapt a broadcast receiver into a [`ChangeFeed`].
///
/// A lagging consumer skips the events it missed and keeps going; the
/// feed ends when every sender is dropped.
pub fn from_broadcast(rx: broadcast::Receiver<RoomChange>) -> ChangeFeed {
    futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => return Some((Ok(change), rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change feed consumer lagged, skipping ahead");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use mongodb::bson::oid::ObjectId;
    use mongodb::bson::{DateTime, doc};
    use roomcast_types::RoomId;

    use super::*;

    fn stream_event(body: Document) -> ChangeStreamEvent<Document> {
        let mut event = doc! {
            "_id": { "_data": "8265A1F0C2000000012B" },
            "ns": { "db": "roomcast", "coll": "rooms" },
        };
        event.extend(body);
        // Decode from raw bytes like the driver does; `from_document` cannot
        // borrow the operation name for kinds the driver doesn't know.
        let bytes = mongodb::bson::to_vec(&event).unwrap();
        mongodb::bson::from_slice(&bytes).unwrap()
    }

    #[test]
    fn update_event_keeps_fields_and_room_id() {
        let oid = ObjectId::parse_str("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let sent = DateTime::from_millis(1_700_000_000_000);
        let change = from_stream_event(stream_event(doc! {
            "operationType": "update",
            "documentKey": { "_id": oid },
            "updateDescription": {
                "updatedFields": {
                    "messages.3": { "message": "hi", "name": "alice", "received": false },
                    "lastMessage": "hi",
                    "count": 4_i32,
                    "sentAt": sent,
                },
                "removedFields": ["draft"],
                "truncatedArrays": [{ "field": "messages", "newSize": 3_i32 }],
            },
        }));

        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.room_id, Some(RoomId::new("65a1f0c2e4b0a1b2c3d4e5f6")));

        let update = change.update.unwrap();
        let fields = &update.updated_fields;
        assert_eq!(fields["messages.3"]["name"], "alice");
        assert_eq!(fields["messages.3"]["received"], false);
        assert_eq!(fields["lastMessage"], "hi");
        // Relaxed extended JSON: plain numbers, tagged dates.
        assert_eq!(fields["count"], 4);
        assert!(fields["sentAt"]["$date"].is_string());
        assert_eq!(update.removed_fields, vec![String::from("draft")]);
        assert_eq!(
            update.truncated_arrays,
            vec![TruncatedArray {
                field: String::from("messages"),
                new_size: 3,
            }]
        );
    }

    #[test]
    fn update_without_truncation_has_empty_list() {
        let change = from_stream_event(stream_event(doc! {
            "operationType": "update",
            "documentKey": { "_id": ObjectId::new() },
            "updateDescription": { "updatedFields": { "name": "random" }, "removedFields": [] },
        }));
        let update = change.update.unwrap();
        assert_eq!(update.updated_fields["name"], "random");
        assert!(update.removed_fields.is_empty());
        assert!(update.truncated_arrays.is_empty());
    }

    #[test]
    fn replace_and_delete_carry_no_update() {
        let oid = ObjectId::new();
        let replaced = from_stream_event(stream_event(doc! {
            "operationType": "replace",
            "documentKey": { "_id": oid },
            "fullDocument": { "_id": oid, "name": "general", "messages": [] },
        }));
        assert_eq!(replaced.kind, ChangeKind::Replace);
        assert_eq!(replaced.room_id, Some(room_id_of(oid)));
        assert!(replaced.update.is_none());

        let deleted = from_stream_event(stream_event(doc! {
            "operationType": "delete",
            "documentKey": { "_id": oid },
        }));
        assert_eq!(deleted.kind, ChangeKind::Delete);
        assert_eq!(deleted.room_id, Some(room_id_of(oid)));
        assert!(deleted.update.is_none());
    }

    #[test]
    fn non_object_id_key_has_no_room() {
        let change = from_stream_event(stream_event(doc! {
            "operationType": "insert",
            "documentKey": { "_id": "custom-key" },
        }));
        assert_eq!(change.kind, ChangeKind::Insert);
        assert!(change.room_id.is_none());
    }

    #[test]
    fn other_kinds_keep_server_names() {
        for (server, expected) in [
            ("drop", "drop"),
            ("rename", "rename"),
            ("dropDatabase", "dropDatabase"),
            ("invalidate", "invalidate"),
            ("shardCollection", "shardCollection"),
        ] {
            let change = from_stream_event(stream_event(doc! { "operationType": server }));
            assert_eq!(change.kind, ChangeKind::Other(String::from(expected)));
            assert_eq!(change.kind.to_string(), expected);
            assert!(change.room_id.is_none());
            assert!(change.update.is_none());
        }
    }

    #[tokio::test]
    async fn broadcast_feed_preserves_order() {
        let (tx, rx) = broadcast::channel(8);
        let mut feed = from_broadcast(rx);

        tx.send(RoomChange::inserted(RoomId::new("a"))).unwrap();
        tx.send(RoomChange::inserted(RoomId::new("b"))).unwrap();
        drop(tx);

        let first = feed.next().await.unwrap().unwrap();
        let second = feed.next().await.unwrap().unwrap();
        assert_eq!(first.room_id, Some(RoomId::new("a")));
        assert_eq!(second.room_id, Some(RoomId::new("b")));
        assert!(feed.next().await.is_none());
    }
}
