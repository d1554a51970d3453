#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod command;
pub mod components;
pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod export;
pub mod geometry;
pub mod id_generator;
pub mod input;
pub mod panels;
pub mod raster;
pub mod redaction;
pub mod renderer;
pub mod state;
pub mod tools;
pub mod util;
pub mod widgets;

pub use app::PdfOverlayApp;
pub use command::{ChangeOrigin, Command, CommandError, HistoryManager, HistoryState};
pub use document::{Document, PageSource};
pub use element::{Element, ElementKind, ElementStore};
pub use error::LoadError;
pub use event::{EditorEvent, EventBus};
pub use export::{ExportPlan, PdfMutator};
pub use geometry::{CoordinateMapper, PageSize, Position, Size};
pub use input::{InputEvent, InputLocation};
pub use renderer::OverlayRenderer;
pub use state::{EditorConfig, EditorContext};
pub use tools::{InteractionController, ToolKind, ToolSettings};
