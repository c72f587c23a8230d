//! Per-surface canvas engine: undo/redo history plus raster export.
//!
//! One engine belongs to one live drawing surface. It is not shared across
//! surfaces and needs no locking.

use sketch_core::{History, Snapshot};

use crate::error::RenderResult;
use crate::export::{RasterExporter, RasterFormat};

/// Undo/redo-capable drawing surface.
#[derive(Debug, Clone)]
pub struct CanvasEngine {
    history: History,
    exporter: RasterExporter,
    width: u32,
    height: u32,
}

impl CanvasEngine {
    /// Create an engine for a `width` x `height` surface with the default
    /// history capacity.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_history(width, height, History::new())
    }

    /// Create an engine retaining at most `capacity` snapshots.
    #[must_use]
    pub fn with_capacity(width: u32, height: u32, capacity: usize) -> Self {
        Self::with_history(width, height, History::with_capacity(capacity))
    }

    fn with_history(width: u32, height: u32, history: History) -> Self {
        Self {
            history,
            exporter: RasterExporter::with_defaults(),
            width,
            height,
        }
    }

    /// Replace the exporter (e.g. for a different JPEG background).
    #[must_use]
    pub fn with_exporter(mut self, exporter: RasterExporter) -> Self {
        self.exporter = exporter;
        self
    }

    /// Record the surface after a completed stroke or shape.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.history.commit(snapshot);
        tracing::trace!(
            len = self.history.len(),
            position = self.history.position(),
            "Committed snapshot"
        );
    }

    /// Step back one stroke. `None` means there was nothing to undo.
    pub fn undo(&mut self) -> Option<Snapshot> {
        self.history.undo().cloned()
    }

    /// Step forward one stroke. `None` means there was nothing to redo.
    pub fn redo(&mut self) -> Option<Snapshot> {
        self.history.redo().cloned()
    }

    /// Whether an undo is possible.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether a redo is possible.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The displayed surface; a blank white surface before the first commit.
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.history
            .current()
            .cloned()
            .unwrap_or_else(|| Snapshot::blank(self.width, self.height))
    }

    /// Encode the displayed surface. Does not touch history.
    ///
    /// # Errors
    ///
    /// Returns an encoding error if the surface cannot be rendered, e.g. a
    /// zero-area canvas. Callers should report it rather than retry.
    pub fn export_raster(&self, format: RasterFormat, quality: f32) -> RenderResult<Vec<u8>> {
        self.exporter.export(&self.current(), format, quality)
    }

    /// Blank the surface. Prior strokes stay undoable.
    pub fn clear(&mut self) {
        self.commit(Snapshot::blank(self.width, self.height));
    }

    /// Surface dimensions `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of retained snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether nothing has been committed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Cursor index of the displayed snapshot.
    #[must_use]
    pub fn position(&self) -> usize {
        self.history.position()
    }

    /// Maximum number of retained snapshots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.history.capacity()
    }

    /// Pixel bytes held by history.
    #[must_use]
    pub fn retained_bytes(&self) -> usize {
        self.history.retained_bytes()
    }

    /// Read-only access to the underlying history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    fn stroke(engine: &CanvasEngine, shade: u8) -> Snapshot {
        let (w, h) = engine.dimensions();
        Snapshot::filled(w, h, [shade, 0, 0, 255])
    }

    #[test]
    fn test_empty_engine_current_is_blank() {
        let engine = CanvasEngine::new(4, 3);
        let current = engine.current();
        assert_eq!((current.width(), current.height()), (4, 3));
        assert!(current.pixels().iter().all(|&b| b == 255));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut engine = CanvasEngine::new(2, 2);
        let a = stroke(&engine, 1);
        let b = stroke(&engine, 2);
        engine.commit(a.clone());
        engine.commit(b.clone());

        assert_eq!(engine.undo(), Some(a));
        assert_eq!(engine.redo(), Some(b.clone()));
        assert_eq!(engine.current(), b);
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut engine = CanvasEngine::new(2, 2);
        let drawing = stroke(&engine, 9);
        engine.commit(drawing.clone());
        engine.clear();

        assert!(engine.current().pixels().iter().all(|&b| b == 255));
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.undo(), Some(drawing));
    }

    #[test]
    fn test_export_does_not_mutate_history() {
        let mut engine = CanvasEngine::new(2, 2);
        engine.commit(stroke(&engine, 5));
        engine.commit(stroke(&engine, 6));
        engine.undo();

        let before = (engine.len(), engine.position(), engine.current());
        engine.export_raster(RasterFormat::Png, 1.0).expect("png");
        engine.export_raster(RasterFormat::Jpeg, 0.5).expect("jpeg");
        assert_eq!((engine.len(), engine.position(), engine.current()), before);
    }

    #[test]
    fn test_zero_area_export_fails() {
        let engine = CanvasEngine::new(0, 100);
        assert!(matches!(
            engine.export_raster(RasterFormat::Png, 1.0),
            Err(RenderError::EmptySurface { .. })
        ));
    }

    #[test]
    fn test_capacity_is_respected() {
        let mut engine = CanvasEngine::with_capacity(1, 1, 5);
        for shade in 0..12 {
            engine.commit(stroke(&engine, shade));
        }
        assert_eq!(engine.len(), 5);
        assert_eq!(engine.position(), 4);
        assert_eq!(engine.capacity(), 5);
        assert_eq!(engine.retained_bytes(), 20);
    }
}
