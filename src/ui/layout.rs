use crate::core::geometry::{Rect, Strut};

pub const MF_MIN: f32 = 0.05;
pub const MF_MAX: f32 = 0.95;

/// Parameters of the master-stack layout for a single monitor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MasterStackLayout {
    pub gaps: u32,
    pub border_width: u32,
    pub master_fraction: f32,
}

impl MasterStackLayout {
    pub fn new(gaps: u32, border_width: u32, master_fraction: f32) -> Self {
        Self {
            gaps,
            border_width,
            master_fraction: master_fraction.clamp(MF_MIN, MF_MAX),
        }
    }

    /// Monitor area minus struts, shrunk by the outer gap. Never collapses
    /// below one pixel in either direction.
    pub fn usable_area(&self, monitor: Rect, reserve: Strut) -> Rect {
        let gaps = self.gaps as i64;
        let w = monitor.w as i64 - reserve.left as i64 - reserve.right as i64 - 2 * gaps;
        let h = monitor.h as i64 - reserve.top as i64 - reserve.bottom as i64 - 2 * gaps;
        Rect::new(
            monitor.x + reserve.left as i32 + self.gaps as i32,
            monitor.y + reserve.top as i32 + self.gaps as i32,
            w.max(1) as u32,
            h.max(1) as u32,
        )
    }

    /// Outer slots (border included) for `stack.len() + 1` clients: the
    /// master first, then one slot per stack row. `stack` carries each stack
    /// client's explicit height, if it has one.
    pub fn slots(&self, area: Rect, stack: &[Option<u32>]) -> Vec<Rect> {
        if stack.is_empty() {
            return vec![area];
        }

        let gaps = self.gaps as i64;
        let usable_w = area.w as i64;
        let master_w = ((usable_w as f32 * self.master_fraction) as i64).max(1);
        let stack_w = (usable_w - master_w - gaps).max(1);
        let stack_x = area.x as i64 + master_w + gaps;

        let mut slots = Vec::with_capacity(stack.len() + 1);
        slots.push(Rect::new(area.x, area.y, master_w as u32, area.h));

        let mut y = area.y as i64;
        for height in self.stack_heights(area.h, stack) {
            slots.push(Rect::new(stack_x as i32, y as i32, stack_w as u32, height));
            y += height as i64 + gaps;
        }
        slots
    }

    /// Row heights of the stack column. Their sum plus the gaps between rows
    /// equals `usable_h` whenever that is achievable with the minimum row
    /// height. Overflow is taken from the top rows down, never from the last
    /// row; the last row absorbs whatever is left over.
    pub fn stack_heights(&self, usable_h: u32, stack: &[Option<u32>]) -> Vec<u32> {
        let count = stack.len();
        if count == 0 {
            return Vec::new();
        }

        let min_h = (self.border_width * 2 + 1) as i64;
        let between = self.gaps as i64 * (count as i64 - 1);
        let avail = (usable_h as i64 - between).max(min_h);

        let fixed: i64 = stack.iter().flatten().map(|h| *h as i64).sum();
        let auto_count = stack.iter().filter(|h| h.is_none()).count() as i64;
        let auto_h = if auto_count > 0 {
            ((avail - fixed) / auto_count).max(min_h)
        } else {
            0
        };

        let mut heights: Vec<i64> = stack
            .iter()
            .map(|h| h.map(|h| (h as i64).max(min_h)).unwrap_or(auto_h))
            .collect();

        let last = count - 1;
        let mut overflow = heights.iter().sum::<i64>() - avail;
        for height in heights[..last].iter_mut() {
            if overflow <= 0 {
                break;
            }
            let take = (*height - min_h).min(overflow);
            *height -= take;
            overflow -= take;
        }

        let above: i64 = heights[..last].iter().sum();
        heights[last] = (avail - above).max(min_h);

        heights.into_iter().map(|h| h as u32).collect()
    }

    /// Content boxes for the master-stack arrangement.
    pub fn arrange(&self, area: Rect, stack: &[Option<u32>]) -> Vec<Rect> {
        self.slots(area, stack)
            .into_iter()
            .map(|slot| self.content(slot))
            .collect()
    }

    /// Every client gets the whole area; stacking order decides visibility.
    pub fn monocle(&self, area: Rect, count: usize) -> Vec<Rect> {
        vec![self.content(area); count]
    }

    fn content(&self, slot: Rect) -> Rect {
        let bw2 = self.border_width as i64 * 2;
        Rect::new(
            slot.x,
            slot.y,
            (slot.w as i64 - bw2).max(1) as u32,
            (slot.h as i64 - bw2).max(1) as u32,
        )
    }
}
