//! Kiln studio: a small scene that exercises the engine end to end.
//!
//! A three-level 3D spinner whose tip tints the clear colour, and a full-window 2D
//! panel with an anchored header and badge. `Escape` quits.

use std::process;

use glam::{Quat, Vec3};
use kiln_engine::World;
use kiln_engine::coords::{ColorRgba, Rect, Vec2};
use kiln_engine::input::Key;
use kiln_engine::job::Job;
use kiln_engine::render::{DynBackend, Layer, RenderItem};
use kiln_engine::scene::{Anchors, Component, Entity2DId, EntityId, OffloadCtx, RectTransform, Transform, TransformView};

/// Hub rotation speed, radians per second.
const SPIN_SPEED: f32 = 1.2;
const BADGE_SIZE: f32 = 96.0;
const HEADER_HEIGHT: f32 = 48.0;

fn main() {
    let mut demo: Option<Demo> = None;

    let code = kiln_engine::run_with_setup(std::env::args(), |engine| {
        engine
            .on_start(|world: &mut World| {
                log::info!(
                    "studio up: {}x{} logical",
                    world.viewport.logical_width(),
                    world.viewport.logical_height()
                );
            })
            .on_tick(move |world: &mut World| {
                if demo.is_none() {
                    demo = Demo::spawn(world);
                }
                if let Some(demo) = demo.as_mut() {
                    demo.update(world);
                }
            })
    });

    process::exit(code);
}

struct Demo {
    hub: EntityId,
    panel: Entity2DId,
}

impl Demo {
    fn spawn(world: &mut World) -> Option<Self> {
        let scene = &mut world.scene;

        let hub = scene.spawn(None, Transform::IDENTITY)?;
        let arm = scene.spawn(Some(hub), Transform::from_position(Vec3::new(2.0, 0.0, 0.0)))?;
        let tip = scene.spawn(Some(arm), Transform::from_position(Vec3::new(3.0, 0.0, 0.0)))?;
        scene.add_component(
            tip,
            Tint {
                base: ColorRgba::new(0.05, 0.06, 0.09, 1.0),
                accent: ColorRgba::new(0.22, 0.10, 0.30, 1.0),
            },
        )?;

        let size = Vec2::new(world.viewport.logical_width(), world.viewport.logical_height());
        let panel = scene.spawn_2d(None, RectTransform::new(Rect::from_origin_size(Vec2::zero(), size)))?;

        // The header stretches with the panel's right edge; the badge keeps its rect
        // and rides along with the bottom-right corner through its position anchor.
        let header = scene.spawn_2d(
            Some(panel),
            RectTransform::new(Rect::from_origin_size(Vec2::zero(), Vec2::new(size.x, HEADER_HEIGHT)))
                .with_anchors(Anchors::new(0.0, 1.0, 0.0, 0.0)),
        )?;
        scene.add_component(header, LayoutLog("header"))?;

        let badge = scene.spawn_2d(
            Some(panel),
            RectTransform::new(Rect::from_origin_size(Vec2::zero(), Vec2::splat(BADGE_SIZE)))
                .with_position(size - Vec2::splat(BADGE_SIZE))
                .with_position_anchor(Vec2::new(1.0, 1.0)),
        )?;
        scene.add_component(badge, LayoutLog("badge"))?;

        log::info!("demo scene spawned");
        Some(Self { hub, panel })
    }

    fn update(&mut self, world: &mut World) {
        if world.input_frame.key_pressed(Key::Escape) {
            world.handle().quit();
            return;
        }

        let spin = Quat::from_rotation_y(SPIN_SPEED * world.time.dt);
        world.scene.entities_mut().rotate(self.hub, spin);

        let size = Vec2::new(world.viewport.logical_width(), world.viewport.logical_height());
        let target = Rect::from_origin_size(Vec2::zero(), size);
        let current = world.scene.entities_2d().get(self.panel).map(RectTransform::rect);
        if current != Some(target) {
            world.scene.entities_2d_mut().set_rect(self.panel, target);
        }
    }
}

/// Clears the frame with a colour that follows the entity around its orbit.
struct Tint {
    base: ColorRgba,
    accent: ColorRgba,
}

impl Component for Tint {
    fn offload(&self, ctx: &OffloadCtx<'_>) -> Option<RenderItem> {
        let TransformView::Spatial(t) = ctx.transform else {
            return None;
        };
        let p = t.position();
        let mix = 0.5 + 0.5 * p.z.atan2(p.x).sin();
        let color = self.base.lerp(self.accent, mix);

        Some(RenderItem::new(
            Layer::WORLD,
            p.z,
            Job::best_effort("tint", move |gpu: &mut DynBackend| gpu.clear(color)),
        ))
    }
}

/// Logs its entity's layout whenever it changes.
struct LayoutLog(&'static str);

impl Component for LayoutLog {
    fn offload(&self, ctx: &OffloadCtx<'_>) -> Option<RenderItem> {
        if let TransformView::Rect(t) = ctx.transform {
            if t.is_dirty() {
                log::debug!("{}: rect {:?}, position {:?}", self.0, t.rect(), t.position());
            }
        }
        None
    }
}
