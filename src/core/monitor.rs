use crate::core::geometry::{Rect, Strut};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Monitor {
    pub rect: Rect,
    pub reserve: Strut,
}

impl Monitor {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            reserve: Strut::default(),
        }
    }

    /// Monitor area with the reserved edges cut away.
    pub fn work_area(&self) -> Rect {
        let w = self.rect.w as i64 - self.reserve.left as i64 - self.reserve.right as i64;
        let h = self.rect.h as i64 - self.reserve.top as i64 - self.reserve.bottom as i64;
        Rect::new(
            self.rect.x + self.reserve.left as i32,
            self.rect.y + self.reserve.top as i32,
            w.max(1) as u32,
            h.max(1) as u32,
        )
    }
}

/// Physical output areas, indexed the way the display server reports them.
/// Never empty.
pub struct Monitors {
    list: Vec<Monitor>,
}

impl Monitors {
    pub fn new(rects: Vec<Rect>, fallback: Rect) -> Self {
        let mut monitors = Self { list: Vec::new() };
        monitors.refresh(rects, fallback);
        monitors
    }

    /// Replaces the monitor list. Reserved space is dropped and has to be
    /// rescanned afterwards.
    pub fn refresh(&mut self, rects: Vec<Rect>, fallback: Rect) {
        let mut rects = rects;
        rects.dedup();
        if rects.is_empty() {
            rects.push(fallback);
        }
        self.list = rects.into_iter().map(Monitor::new).collect();
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get(&self, index: usize) -> &Monitor {
        &self.list[index.min(self.list.len() - 1)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monitor> {
        self.list.iter()
    }

    /// Index of the monitor containing the point, or 0 when the point lies
    /// outside every monitor.
    pub fn monitor_for_point(&self, x: i32, y: i32) -> usize {
        self.list
            .iter()
            .position(|m| m.rect.contains(x, y))
            .unwrap_or(0)
    }

    pub fn monitor_for_rect(&self, rect: Rect) -> usize {
        let (x, y) = rect.center();
        self.monitor_for_point(x, y)
    }

    /// Recomputes reserved space from the given dock windows. Each dock counts
    /// towards the monitor holding its center; edges keep the largest request.
    pub fn apply_struts(&mut self, root: Rect, docks: &[(Rect, Strut)]) {
        for monitor in &mut self.list {
            monitor.reserve = Strut::default();
        }
        for (geometry, strut) in docks {
            let index = self.monitor_for_rect(*geometry);
            let monitor = &mut self.list[index];
            monitor.reserve = monitor.reserve.max(Self::clip(root, monitor.rect, *strut));
        }
    }

    /// `_NET_WM_STRUT` values are measured from the edges of the root window;
    /// convert them to this monitor's edges.
    fn clip(root: Rect, monitor: Rect, strut: Strut) -> Strut {
        let clip = |value: u32, offset: i32, limit: u32| {
            (value as i64 - offset as i64).clamp(0, limit as i64) as u32
        };
        Strut {
            left: clip(strut.left, monitor.x - root.x, monitor.w),
            right: clip(strut.right, root.right() - monitor.right(), monitor.w),
            top: clip(strut.top, monitor.y - root.y, monitor.h),
            bottom: clip(strut.bottom, root.bottom() - monitor.bottom(), monitor.h),
        }
    }

    pub fn work_areas(&self) -> Vec<Rect> {
        self.list.iter().map(Monitor::work_area).collect()
    }

    pub fn next(&self, index: usize) -> usize {
        (index + 1) % self.list.len()
    }

    pub fn prev(&self, index: usize) -> usize {
        (index + self.list.len() - 1) % self.list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dual() -> Monitors {
        Monitors::new(
            vec![Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)],
            Rect::new(0, 0, 3200, 1080),
        )
    }

    #[test]
    fn point_lookup_defaults_to_first_monitor() {
        let monitors = dual();
        assert_eq!(monitors.monitor_for_point(100, 100), 0);
        assert_eq!(monitors.monitor_for_point(2000, 10), 1);
        assert_eq!(monitors.monitor_for_point(-50, 10), 0);
        assert_eq!(monitors.monitor_for_point(2000, 1050), 0);
    }

    #[test]
    fn empty_topology_falls_back_to_screen() {
        let monitors = Monitors::new(Vec::new(), Rect::new(0, 0, 800, 600));
        assert_eq!(monitors.len(), 1);
        assert_eq!(monitors.get(0).rect, Rect::new(0, 0, 800, 600));
    }

    #[test]
    fn struts_accumulate_per_monitor() {
        let mut monitors = dual();
        let root = Rect::new(0, 0, 3200, 1080);
        monitors.apply_struts(root, &[
            (Rect::new(0, 0, 1920, 24), Strut { top: 24, ..Strut::default() }),
            (Rect::new(0, 0, 1920, 30), Strut { top: 30, ..Strut::default() }),
            // 56 rows of root window lie below the shorter monitor.
            (Rect::new(1920, 994, 1280, 30), Strut { bottom: 86, ..Strut::default() }),
        ]);
        assert_eq!(monitors.get(0).reserve.top, 30);
        assert_eq!(monitors.get(0).reserve.bottom, 0);
        assert_eq!(monitors.get(1).reserve.bottom, 30);
        assert_eq!(monitors.work_areas()[0], Rect::new(0, 30, 1920, 1050));
    }

    #[test]
    fn refresh_drops_reserved_space() {
        let mut monitors = dual();
        let root = Rect::new(0, 0, 3200, 1080);
        monitors.apply_struts(root, &[(Rect::new(0, 0, 100, 20), Strut { top: 20, ..Strut::default() })]);
        monitors.refresh(vec![Rect::new(0, 0, 1920, 1080)], Rect::default());
        assert_eq!(monitors.len(), 1);
        assert!(monitors.get(0).reserve.is_empty());
    }

    #[test]
    fn struts_are_measured_from_the_root_edges() {
        let mut monitors = Monitors::new(
            vec![Rect::new(0, 0, 1920, 1080), Rect::new(0, 1080, 1920, 1080)],
            Rect::default(),
        );
        let root = Rect::new(0, 0, 1920, 2160);
        monitors.apply_struts(root, &[
            (Rect::new(0, 1056, 1920, 24), Strut { bottom: 1104, ..Strut::default() }),
            (Rect::new(0, 2136, 1920, 24), Strut { bottom: 24, ..Strut::default() }),
        ]);
        assert_eq!(monitors.get(0).reserve.bottom, 24);
        assert_eq!(monitors.get(1).reserve.bottom, 24);
        assert_eq!(monitors.work_areas()[0], Rect::new(0, 0, 1920, 1056));
    }

    #[test]
    fn cycling_wraps() {
        let monitors = dual();
        assert_eq!(monitors.next(1), 0);
        assert_eq!(monitors.prev(0), 1);
    }
}
