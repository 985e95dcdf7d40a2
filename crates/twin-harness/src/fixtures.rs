//! Album/song fixtures shared by integration and property tests.

use std::cell::RefCell;
use std::rc::Rc;

use twin_core::{ModelHandle, Options, Schema};

use crate::record::{Journal, Record};

/// A record shared between the test and the twin graph.
pub type SharedRecord = (Rc<RefCell<Record>>, ModelHandle);

/// Build a fixture schema. Fixture schemas are well-formed by construction.
fn fixture(builder: twin_core::SchemaBuilder) -> Schema {
    match builder.build() {
        Ok(schema) => schema,
        Err(err) => panic!("fixture schema is invalid: {err}"),
    }
}

/// `song { name, index }`.
#[must_use]
pub fn song_schema() -> Schema {
    fixture(
        Schema::builder("song")
            .property("name", Options::new())
            .property("index", Options::new()),
    )
}

/// `album { title, songs: [song] }`.
#[must_use]
pub fn album_schema() -> Schema {
    fixture(
        Schema::builder("album")
            .property("title", Options::new())
            .collection("songs", Options::new().twin(song_schema())),
    )
}

/// `album { title, artist: { name }, songs: [song], note (virtual) }`.
#[must_use]
pub fn catalog_schema() -> Schema {
    fixture(
        Schema::builder("album")
            .property("title", Options::new())
            .property(
                "artist",
                Options::new().nested(|artist| artist.property("name", Options::new())),
            )
            .collection("songs", Options::new().twin(song_schema()))
            .property("note", Options::new().virtual_field().default_value("")),
    )
}

#[must_use]
pub fn song(name: &str, index: i64, journal: &Journal) -> SharedRecord {
    Record::new("song", name)
        .with("name", name)
        .with("index", index)
        .journal(journal)
        .share()
}

/// A song that already exists in storage.
#[must_use]
pub fn stored_song(name: &str, index: i64, journal: &Journal) -> SharedRecord {
    Record::new("song", name)
        .with("name", name)
        .with("index", index)
        .persisted()
        .journal(journal)
        .share()
}

#[must_use]
pub fn artist(name: &str, journal: &Journal) -> SharedRecord {
    Record::new("artist", name)
        .with("name", name)
        .journal(journal)
        .share()
}

#[must_use]
pub fn album(title: &str, songs: Vec<ModelHandle>, journal: &Journal) -> SharedRecord {
    Record::new("album", title)
        .with("title", title)
        .with("songs", songs)
        .journal(journal)
        .share()
}

/// An album with an artist, for [`catalog_schema`].
#[must_use]
pub fn catalog_album(
    title: &str,
    artist: ModelHandle,
    songs: Vec<ModelHandle>,
    journal: &Journal,
) -> SharedRecord {
    Record::new("album", title)
        .with("title", title)
        .with("artist", artist)
        .with("songs", songs)
        .journal(journal)
        .share()
}
