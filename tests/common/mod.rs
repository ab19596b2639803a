//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use serde_json::{Map, Value, json};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Builder for one conversation in the export's mapping-tree shape.
///
/// Messages are chained root → leaf in the order they are added.
pub struct ConversationBuilder {
    id: String,
    title: String,
    create_time: Option<f64>,
    model_slug: Option<String>,
    messages: Vec<(String, String)>,
}

impl ConversationBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: "Untitled".to_string(),
            create_time: None,
            model_slug: None,
            messages: Vec::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn created(mut self, create_time: f64) -> Self {
        self.create_time = Some(create_time);
        self
    }

    pub fn model(mut self, slug: &str) -> Self {
        self.model_slug = Some(slug.to_string());
        self
    }

    pub fn user(self, text: &str) -> Self {
        self.message("user", text)
    }

    pub fn assistant(self, text: &str) -> Self {
        self.message("assistant", text)
    }

    pub fn message(mut self, role: &str, text: &str) -> Self {
        self.messages.push((role.to_string(), text.to_string()));
        self
    }

    pub fn to_json(&self) -> Value {
        let mut mapping = Map::new();
        mapping.insert(
            "root".to_string(),
            json!({
                "parent": null,
                "children": if self.messages.is_empty() { json!([]) } else { json!(["n0"]) },
                "message": null,
            }),
        );

        for (i, (role, text)) in self.messages.iter().enumerate() {
            let parent = if i == 0 {
                "root".to_string()
            } else {
                format!("n{}", i - 1)
            };
            let children = if i + 1 < self.messages.len() {
                json!([format!("n{}", i + 1)])
            } else {
                json!([])
            };

            mapping.insert(
                format!("n{i}"),
                json!({
                    "parent": parent,
                    "children": children,
                    "message": {
                        "author": { "role": role },
                        "content": { "content_type": "text", "parts": [text] },
                        "create_time": self.create_time.map(|t| t + i as f64),
                    },
                }),
            );
        }

        let mut conv = json!({
            "id": self.id,
            "title": self.title,
            "create_time": self.create_time,
            "update_time": self.create_time,
            "mapping": mapping,
        });
        if let Some(slug) = &self.model_slug {
            conv["default_model_slug"] = json!(slug);
        }
        conv
    }
}

/// Writes an export to a temp directory as `.json` or `.zip`.
pub struct ExportBuilder {
    temp_dir: TempDir,
    conversations: Vec<Value>,
}

impl ExportBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            conversations: Vec::new(),
        }
    }

    pub fn with(mut self, conversation: ConversationBuilder) -> Self {
        self.conversations.push(conversation.to_json());
        self
    }

    pub fn with_raw(mut self, conversation: Value) -> Self {
        self.conversations.push(conversation);
        self
    }

    fn document(&self) -> String {
        Value::Array(self.conversations.clone()).to_string()
    }

    /// Write `conversations.json`; keep the returned `TempDir` alive while in use.
    pub fn write_json(self) -> (TempDir, PathBuf) {
        let path = self.temp_dir.path().join("conversations.json");
        std::fs::write(&path, self.document()).expect("Failed to write conversations.json");
        (self.temp_dir, path)
    }

    /// Write an export archive laid out the way ChatGPT ships it.
    pub fn write_zip(self) -> (TempDir, PathBuf) {
        let path = self.temp_dir.path().join("export.zip");
        let file = File::create(&path).expect("Failed to create export.zip");
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        zip.start_file("user.json", options).expect("Failed to add user.json");
        zip.write_all(b"{}").expect("Failed to write user.json");
        zip.start_file("export-2024/conversations.json", options)
            .expect("Failed to add conversations.json");
        zip.write_all(self.document().as_bytes())
            .expect("Failed to write conversations.json");
        zip.finish().expect("Failed to finish zip");

        (self.temp_dir, path)
    }
}

/// The three-conversation corpus used for ranking checks.
pub fn ranking_export() -> ExportBuilder {
    ExportBuilder::new()
        .with(
            ConversationBuilder::new("c1")
                .title("Python debugging tips")
                .created(1_704_067_200.0)
                .model("gpt-4o")
                .user("fix this python error")
                .assistant("Check the traceback first."),
        )
        .with(
            ConversationBuilder::new("c2")
                .title("Dinner recipes")
                .created(1_706_745_600.0)
                .model("gpt-4o")
                .user("ideas for a quick weeknight dinner")
                .assistant("Try a stir fry."),
        )
        .with(
            ConversationBuilder::new("c3")
                .title("Marketing plan")
                .created(1_709_251_200.0)
                .model("gpt-4")
                .user("draft a launch plan and mention the python script once")
                .assistant("Here is a plan for the launch week."),
        )
}
