//! Cached screen geometry of one 2D view.
//!
//! Rebuilt only when the session reports the canvases dirty, so throttled
//! drags repaint from the last projection instead of re-projecting the cloud
//! every frame.

use crate::editor::session::EditorSession;
use crate::editor::view::ViewKind;
use crate::entities::point_cloud::PointCloud;
use crate::render::projection::{self, BoxOutline, GridLine, HandleMark, PointSprite};

#[derive(Debug, Clone, Default)]
pub struct CanvasCache {
    pub points: Vec<PointSprite>,
    pub outline: Option<BoxOutline>,
    pub handles: Vec<HandleMark>,
    pub grid: Vec<GridLine>,
}

impl CanvasCache {
    pub fn rebuild(&mut self, view: ViewKind, session: &EditorSession, cloud: Option<&PointCloud>) {
        let xf = session.view(view);
        let settings = session.settings();
        self.grid = if settings.show_grid { projection::grid_lines(xf, projection::GRID_SPACING) } else { Vec::new() };

        let (Some(frame), Some(pose)) = (session.effective_frame(view), session.pose(view)) else {
            self.points.clear();
            self.outline = None;
            self.handles.clear();
            return;
        };

        self.points = cloud
            .map(|c| {
                projection::project_cloud(view, &frame, c, xf, session.sample_step(), settings.depth_extension_ratio)
            })
            .unwrap_or_default();
        self.outline = Some(projection::box_outline(&pose, xf));
        let hover = session.hover().filter(|(v, _)| *v == view).map(|(_, kind)| kind);
        self.handles = projection::handle_marks(&session.control_points(view), hover);
    }
}

/// One cache per 2D view, indexed by `ViewKind::index`.
#[derive(Debug, Clone, Default)]
pub struct CanvasSet {
    caches: [CanvasCache; 3],
}

impl CanvasSet {
    pub fn get(&self, view: ViewKind) -> &CanvasCache {
        &self.caches[view.index()]
    }

    pub fn rebuild_all(&mut self, session: &EditorSession, cloud: Option<&PointCloud>) {
        for view in ViewKind::ALL {
            self.caches[view.index()].rebuild(view, session, cloud);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::annotation::LoadReport;
    use crate::entities::oriented_box::OrientedBox;
    use crate::entities::point_cloud::CloudPoint;
    use glam::DVec3;

    #[test]
    fn test_rebuild_follows_selection() {
        let mut session = EditorSession::default();
        let cloud = PointCloud::new(vec![CloudPoint { pos: DVec3::new(0.1, 0.0, 0.0), color: [1.0; 3] }]);
        let mut set = CanvasSet::default();
        set.rebuild_all(&session, Some(&cloud));
        assert!(set.get(ViewKind::Top).outline.is_none());
        assert!(!set.get(ViewKind::Top).grid.is_empty());

        let report = LoadReport { boxes: vec![OrientedBox::axis_aligned("a", DVec3::ZERO, DVec3::ONE)], warnings: vec![] };
        session.load("s", report);
        set.rebuild_all(&session, Some(&cloud));
        for view in ViewKind::ALL {
            let cache = set.get(view);
            assert_eq!(cache.handles.len(), 13);
            assert!(cache.outline.is_some());
        }
        // Sample step 2 keeps point 0.
        assert_eq!(set.get(ViewKind::Front).points.len(), 1);
    }
}
