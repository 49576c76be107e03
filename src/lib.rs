//! Scene core for an electronics-design canvas.
//!
//! Converts hierarchical CAD objects (symbols, sheets, packages, boards) into
//! flat per-layer triangle buffers a GPU backend can upload, keeps per-object
//! identity so edits re-tessellate only what changed, and answers the spatial
//! questions the interaction layer asks: what is under the cursor, and what
//! should the cursor snap to. The library never talks to a window system or a
//! GPU; the host implements [`backend::RenderBackend`] and forwards input to
//! [`engine::Engine`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Interactive engine: cursor snapping, selection, prelight, render hand-off |
//! | [`canvas`] | Scene state, scoped transform/object guards, `update`, push contract |
//! | [`render`] | Per-kind tessellation of domain objects |
//! | [`buffer`] | Per-layer triangles and the object → range arena |
//! | [`fragment`] | Content-fingerprinted cache of placement-independent tessellations |
//! | [`selectables`] | Hit-test proxies keyed by (uuid, kind, vertex) |
//! | [`target`] | Snap targets, nearest-target search, grid snap |
//! | [`layer`] | Layer ids, display state, overlay layer allocation |
//! | [`doc`] | Domain objects consumed from the document layer |
//! | [`transform`] / [`placement`] | Nested placement composition |
//! | [`tessellate`] | Lines, circles, arcs and polygons into triangles |
//! | [`triangle`] | The renderable primitive, colours, type tags, flags |
//! | [`camera`] | Screen ↔ document mapping and zoom |
//! | [`input`] | Modifiers, buttons, cursor and gesture state |
//! | [`backend`] | Seam to the rendering backend and owned frame snapshots |
//! | [`sync`] | Edit tickets and the newest-edit frame slot for background rebuilds |
//! | [`geom`] | Coordinates and bounding boxes |
//! | [`config`] / [`error`] / [`consts`] | Configuration, error types, shared constants |

pub mod backend;
pub mod buffer;
pub mod camera;
pub mod canvas;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod geom;
pub mod input;
pub mod layer;
pub mod placement;
pub mod render;
pub mod selectables;
pub mod sync;
pub mod target;
pub mod tessellate;
pub mod transform;
pub mod triangle;
