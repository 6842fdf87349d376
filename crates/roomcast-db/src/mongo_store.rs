//! `MongoDB` backend for the Room Store.
//!
//! Every mutation is a single-document server-side operation. Appending a
//! message uses `$push` through `findOneAndUpdate`, so concurrent appends
//! to the same room never overwrite each other.

use futures::stream::{StreamExt, TryStreamExt};
use mongodb::Collection;
use mongodb::bson::{self, Document, doc};
use mongodb::options::ReturnDocument;
use roomcast_types::{
    FieldSelector, Message, NewRoom, Room, RoomId, RoomPatch, RoomProjection, fields,
};

use crate::change_feed::{self, ChangeFeed};
use crate::documents::{NewRoomDocument, ProjectedRoomDocument, RoomDocument, parse_room_id};
use crate::error::DbError;
use crate::mongo::MongoPool;

/// Name of the collection holding room documents.
pub const ROOMS_COLLECTION: &str = "rooms";

/// Room operations against the `rooms` collection.
#[derive(Clone)]
pub struct MongoRoomStore {
    pool: MongoPool,
    rooms: Collection<RoomDocument>,
}

impl MongoRoomStore {
    /// Create a store bound to the pool's database.
    pub fn new(pool: MongoPool) -> Self {
        let rooms = pool.database().collection::<RoomDocument>(ROOMS_COLLECTION);
        Self { pool, rooms }
    }

    /// The underlying client handle.
    pub const fn pool(&self) -> &MongoPool {
        &self.pool
    }

    /// List rooms in natural order, projected to `selector` when given.
    pub async fn list_rooms(
        &self,
        selector: Option<&FieldSelector>,
    ) -> Result<Vec<RoomProjection>, DbError> {
        let projected = self.rooms.clone_with_type::<ProjectedRoomDocument>();
        let mut find = projected.find(doc! {});
        if let Some(projection) = selector.and_then(projection_of) {
            find = find.projection(projection);
        }

        let docs: Vec<ProjectedRoomDocument> = find.await?.try_collect().await?;
        tracing::debug!(count = docs.len(), "Listed rooms");
        Ok(docs.into_iter().map(RoomProjection::from).collect())
    }

    /// Fetch one room by id.
    pub async fn get_room(&self, id: &RoomId) -> Result<Room, DbError> {
        let oid = parse_room_id(id)?;
        self.rooms
            .find_one(doc! { "_id": oid })
            .await?
            .map(Room::from)
            .ok_or_else(|| DbError::NotFound(id.clone()))
    }

    /// Atomically push `message` onto the room's list and return the
    /// updated room.
    pub async fn append_message(&self, id: &RoomId, message: &Message) -> Result<Room, DbError> {
        let oid = parse_room_id(id)?;
        let entry = bson::to_bson(message)?;

        let room = self
            .rooms
            .find_one_and_update(
                doc! { "_id": oid },
                doc! { "$push": { "messages": entry } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .map(Room::from)
            .ok_or_else(|| DbError::NotFound(id.clone()))?;

        tracing::debug!(room_id = %id, messages = room.messages.len(), "Appended message");
        Ok(room)
    }

    /// Apply a shallow field update and return the updated room.
    ///
    /// An empty patch writes nothing and returns the current room.
    pub async fn patch_room(&self, id: &RoomId, patch: &RoomPatch) -> Result<Room, DbError> {
        patch.validate()?;
        if patch.is_empty() {
            return self.get_room(id).await;
        }

        let oid = parse_room_id(id)?;
        let set = set_document(patch)?;

        let room = self
            .rooms
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .map(Room::from)
            .ok_or_else(|| DbError::NotFound(id.clone()))?;

        tracing::debug!(room_id = %id, fields = ?patch.touched_fields(), "Patched room");
        Ok(room)
    }

    /// Insert a new room and return it with its assigned id.
    pub async fn create_room(&self, input: NewRoom) -> Result<Room, DbError> {
        let doc = NewRoomDocument::from_input(input)?;

        let result = self
            .rooms
            .clone_with_type::<NewRoomDocument>()
            .insert_one(&doc)
            .await?;

        let oid = result.inserted_id.as_object_id().ok_or_else(|| {
            DbError::Config(format!(
                "insert returned a non-ObjectId _id: {}",
                result.inserted_id
            ))
        })?;

        tracing::debug!(room_id = %oid, "Created room");
        Ok(doc.into_room(oid))
    }

    /// Open a change stream on the collection.
    pub async fn watch(&self) -> Result<ChangeFeed, DbError> {
        let stream = self.rooms.clone_with_type::<Document>().watch().await?;
        tracing::info!(collection = ROOMS_COLLECTION, "Opened change stream");
        Ok(stream
            .map(|event| event.map(change_feed::from_stream_event).map_err(DbError::from))
            .boxed())
    }

    /// Round-trip a `ping` to the server.
    pub async fn ping(&self) -> Result<(), DbError> {
        self.pool.ping().await
    }
}

/// Build an inclusion projection; `None` when every field is wanted.
fn projection_of(selector: &FieldSelector) -> Option<Document> {
    if selector.is_empty() {
        return None;
    }
    let mut projection = Document::new();
    for field in selector.iter() {
        projection.insert(field, 1_i32);
    }
    Some(projection)
}

/// The `$set` body for the fields present in `patch`.
fn set_document(patch: &RoomPatch) -> Result<Document, DbError> {
    let mut set = Document::new();
    if let Some(name) = &patch.name {
        set.insert(fields::NAME, name.as_str());
    }
    if let Some(last_message) = &patch.last_message {
        set.insert(fields::LAST_MESSAGE, last_message.as_str());
    }
    if let Some(messages) = &patch.messages {
        set.insert(fields::MESSAGES, bson::to_bson(messages)?);
    }
    Ok(set)
}
