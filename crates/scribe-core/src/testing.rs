use scribe_db::Database;
use uuid::Uuid;

use crate::viewer::Viewer;

pub(crate) fn db() -> Database {
    Database::open_in_memory().unwrap()
}

/// Register a user directly in the store and return them as a viewer.
pub(crate) fn user(db: &Database, username: &str) -> Viewer {
    let id = Uuid::new_v4();
    db.create_user(&id.to_string(), username, "not-a-real-hash").unwrap();
    Viewer::user(id, username)
}

pub(crate) fn post(db: &Database, author: &Viewer, text: &str) -> i64 {
    let identity = author.identity().unwrap();
    db.insert_post(&identity.id.to_string(), None, text, None).unwrap()
}
