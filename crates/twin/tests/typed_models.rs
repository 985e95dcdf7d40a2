//! The facade over hand-written, strongly typed models.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use twin::prelude::*;

// ── Models ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Song {
    name: String,
    index: i64,
    saved: bool,
}

impl Model for Song {
    fn identity(&self) -> String {
        format!("Song({})", self.name)
    }

    fn read(&self, accessor: &str) -> Option<Field> {
        match accessor {
            "name" => Some(Field::from(self.name.as_str())),
            "index" => Some(Field::from(self.index)),
            _ => None,
        }
    }

    fn write(&mut self, accessor: &str, value: Field) -> Result<(), ModelError> {
        let value = value.as_value().cloned().unwrap_or_default();
        match accessor {
            "name" => self.name = value.as_str().unwrap_or_default().to_owned(),
            "index" => self.index = value.as_i64().unwrap_or_default(),
            _ => return Err(ModelError::UnknownAccessor(accessor.to_owned())),
        }
        Ok(())
    }

    fn save(&mut self) -> Result<(), ModelError> {
        self.saved = true;
        Ok(())
    }

    fn is_persisted(&self) -> bool {
        self.saved
    }
}

#[derive(Debug, Default)]
struct Album {
    title: String,
    songs: Vec<ModelHandle>,
    saved: bool,
}

impl Model for Album {
    fn identity(&self) -> String {
        format!("Album({})", self.title)
    }

    fn read(&self, accessor: &str) -> Option<Field> {
        match accessor {
            "title" => Some(Field::from(self.title.as_str())),
            "songs" => Some(Field::from(self.songs.clone())),
            _ => None,
        }
    }

    fn write(&mut self, accessor: &str, value: Field) -> Result<(), ModelError> {
        match (accessor, value) {
            ("title", Field::Value(value)) => {
                self.title = value.as_str().unwrap_or_default().to_owned();
            }
            ("songs", Field::Models(songs)) => self.songs = songs,
            (accessor, _) => return Err(ModelError::UnknownAccessor(accessor.to_owned())),
        }
        Ok(())
    }

    fn save(&mut self) -> Result<(), ModelError> {
        self.saved = true;
        Ok(())
    }

    fn is_persisted(&self) -> bool {
        self.saved
    }
}

fn schema() -> Schema {
    Schema::from_json(
        r#"{
            "name": "album",
            "properties": [
                { "name": "title" },
                { "name": "songs", "kind": "collection", "schema": {
                    "name": "song",
                    "properties": [{ "name": "name" }, { "name": "index" }]
                } }
            ]
        }"#,
    )
    .unwrap()
}

// ═════════════════════════════════════════════════════════════════════════
// Scenarios
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn skamobile_round_trip() {
    let album = Rc::new(RefCell::new(Album {
        title: "Nice Try".into(),
        ..Album::default()
    }));
    let twin = Twin::from_model(schema(), ModelHandle::from(Rc::clone(&album))).unwrap();

    twin.set("title", "Skamobile").unwrap();
    let adondo = Rc::new(RefCell::new(Song {
        name: "Adondo".into(),
        index: 1,
        saved: false,
    }));
    twin.collection("songs")
        .unwrap()
        .append(ModelHandle::from(Rc::clone(&adondo)))
        .unwrap();

    assert_eq!(
        twin.sync_with(|nested| nested),
        json!({ "title": "Skamobile", "songs": [{ "name": "Adondo", "index": 1 }] })
    );
    assert_eq!(album.borrow().title, "Nice Try");
    assert!(album.borrow().songs.is_empty());

    twin.save().unwrap();

    assert_eq!(album.borrow().title, "Skamobile");
    assert_eq!(album.borrow().songs.len(), 1);
    assert!(album.borrow().saved);
    assert!(adondo.borrow().saved);
}

#[cfg(feature = "callbacks")]
#[test]
fn callbacks_after_save() {
    let album = ModelHandle::new(Album {
        title: "Nice Try".into(),
        ..Album::default()
    });
    let twin = Twin::from_model(schema(), album).unwrap();
    twin.collection("songs")
        .unwrap()
        .append(ModelHandle::new(Song {
            name: "Adondo".into(),
            index: 1,
            saved: false,
        }))
        .unwrap();
    twin.save().unwrap();

    let seen = RefCell::new(Vec::new());
    let group: Group<RefCell<Vec<String>>> = Group::builder()
        .on(
            Event::Create,
            Handler::new("album_created", |twin: &Twin, seen: &RefCell<Vec<String>>| {
                seen.borrow_mut().push(twin.value("title")?.to_string());
                Ok(())
            }),
        )
        .collection("songs", |songs| {
            songs.on(
                Event::AddCreate,
                Handler::new("song_created", |twin: &Twin, seen: &RefCell<Vec<String>>| {
                    seen.borrow_mut().push(twin.value("name")?.to_string());
                    Ok(())
                }),
            )
        })
        .build();

    let dispatch = group.call(&twin, &seen).unwrap();

    assert_eq!(dispatch.handlers(), ["album_created", "song_created"]);
    assert_eq!(*seen.borrow(), ["\"Nice Try\"", "\"Adondo\""]);
}
