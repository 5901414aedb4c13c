use crate::{
    core::{
        display::{DisplayService, WindowId},
        geometry::Rect,
        wm::WindowManager,
    },
    ui::layout::MasterStackLayout,
};

impl<D: DisplayService> WindowManager<D> {
    pub(crate) fn layout(&self, monitor: usize) -> MasterStackLayout {
        MasterStackLayout::new(
            self.config.appearance.gaps,
            self.border_width(),
            self.config.master_width(monitor),
        )
    }

    /// Arranges the visible workspace on every monitor and restacks.
    pub fn tile(&mut self) {
        let workspace = self.current_workspace;
        let monocle = self.clients.workspace(workspace).monocle;

        for index in 0..self.monitors.len() {
            let monitor = *self.monitors.get(index);
            let layout = self.layout(index);
            let area = layout.usable_area(monitor.rect, monitor.reserve);

            let placements: Vec<(WindowId, Rect)> = if monocle {
                let ids: Vec<WindowId> = self
                    .clients
                    .clients_on(workspace)
                    .filter(|c| c.mapped && !c.fullscreen && c.monitor == index)
                    .map(|c| c.id)
                    .collect();
                let rects = layout.monocle(area, ids.len());
                ids.into_iter().zip(rects).collect()
            } else {
                let tiled: Vec<(WindowId, Option<u32>)> = self
                    .clients
                    .clients_on(workspace)
                    .filter(|c| c.is_tiled() && c.monitor == index)
                    .map(|c| (c.id, c.stack_height))
                    .collect();
                if tiled.is_empty() {
                    continue;
                }
                let heights: Vec<Option<u32>> = tiled[1..].iter().map(|(_, h)| *h).collect();
                let rects = layout.arrange(area, &heights);
                tiled.into_iter().map(|(id, _)| id).zip(rects).collect()
            };

            for (id, rect) in placements {
                self.place(id, rect);
            }
        }
        self.restack();
    }

    /// Moves a client unless it already sits at `rect`.
    pub(crate) fn place(&mut self, id: WindowId, rect: Rect) {
        let bw = self.border_width();
        let Some(client) = self.clients.get_mut(id) else {
            return;
        };
        if client.geometry == rect {
            return;
        }
        client.geometry = rect;
        self.display.configure(id, rect, bw);
    }

    /// Stacking order: floating clients above tiled ones when configured,
    /// fullscreen clients above everything.
    pub(crate) fn restack(&mut self) {
        let workspace = self.current_workspace;
        if self.clients.workspace(workspace).monocle {
            if let Some(id) = self.focused.filter(|&id| self.is_visible(id)) {
                self.display.raise(id);
            }
        } else if self.config.floating_on_top {
            let floating: Vec<WindowId> = self
                .clients
                .clients_on(workspace)
                .filter(|c| c.mapped && c.floating && !c.fullscreen)
                .map(|c| c.id)
                .collect();
            for id in floating {
                self.display.raise(id);
            }
        }

        let fullscreen: Vec<WindowId> = self
            .clients
            .clients_on(workspace)
            .filter(|c| c.mapped && c.fullscreen)
            .map(|c| c.id)
            .collect();
        for id in fullscreen {
            self.display.raise(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::loader::Config,
        core::display::WindowType,
        input::event::Event,
        utils::testing::{open, wm, wm_on, Call},
    };

    #[test]
    fn master_and_stack_on_full_hd() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1138, 1058)));
        assert_eq!(wm.display.geometry(11), Some(Rect::new(1160, 10, 748, 523)));
        assert_eq!(wm.display.geometry(12), Some(Rect::new(1160, 545, 748, 523)));
    }

    #[test]
    fn fourth_client_only_reflows_the_stack() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        wm.display.calls.clear();
        open(&mut wm, 13, "st");

        assert!(!wm.display.calls.iter().any(|c| matches!(c, Call::Configure(10, ..))));
        assert_eq!(wm.display.geometry(11), Some(Rect::new(1160, 10, 748, 344)));
        assert_eq!(wm.display.geometry(12), Some(Rect::new(1160, 366, 748, 344)));
        assert_eq!(wm.display.geometry(13), Some(Rect::new(1160, 722, 748, 346)));
    }

    #[test]
    fn retiling_unchanged_layout_sends_nothing() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        wm.display.calls.clear();
        wm.tile();
        assert_eq!(wm.display.configures(), 0);
    }

    #[test]
    fn floating_clients_are_left_alone() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.display.add_window(11, "dialog").kind = WindowType::Dialog;
        wm.handle_event(Event::MapRequest { window: 11 });

        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1898, 1058)));
        assert_eq!(wm.display.geometry(11), Some(Rect::new(759, 389, 400, 300)));
        // Floating windows go above the tiled ones.
        assert!(wm.display.calls.contains(&Call::Raise(11)));
    }

    #[test]
    fn each_monitor_gets_its_own_layout() {
        let monitors = vec![Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)];
        let mut wm = wm_on(monitors, Config::default());
        open(&mut wm, 10, "st");
        wm.display.pointer.x = 2000;
        open(&mut wm, 11, "st");

        assert_eq!(wm.clients.get(11).unwrap().monitor, 1);
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1898, 1058)));
        assert_eq!(wm.display.geometry(11), Some(Rect::new(1930, 10, 1258, 1002)));
    }

    #[test]
    fn explicit_stack_heights_are_used() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        wm.clients.get_mut(11).unwrap().stack_height = Some(300);
        wm.tile();
        assert_eq!(wm.display.geometry(11), Some(Rect::new(1160, 10, 748, 298)));
        assert_eq!(wm.display.geometry(12), Some(Rect::new(1160, 320, 748, 748)));
    }
}
