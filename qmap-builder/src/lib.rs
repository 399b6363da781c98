pub mod example;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    pub enum BuildError {
        #[error("staircase needs at least one step")]
        InvalidStepCount,
        #[error("degenerate box: min={min:?} max={max:?}")]
        DegenerateBox { min: [f64; 3], max: [f64; 3] },
        #[error("wall thickness {thickness} does not fit room size {size:?}")]
        InvalidThickness { thickness: f64, size: [f64; 3] },
    }
}

pub mod brushes {
    use std::f64::consts::TAU;

    use qmap_core::document::{Brush, DEFAULT_TEXTURE};
    use qmap_core::geometry::{Bounds3D, Plane, Point3, Vector3};
    use tracing::{debug, warn};

    use crate::errors::BuildError;

    /// 螺旋楼梯单级台阶的尺寸（宽 × 深 × 厚）。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct StepDimensions {
        pub width: f64,
        pub depth: f64,
        pub thickness: f64,
    }

    impl Default for StepDimensions {
        fn default() -> Self {
            Self {
                width: 48.0,
                depth: 64.0,
                thickness: 8.0,
            }
        }
    }

    /// 由参数化描述生成盒体笔刷及其组合体（房间、楼梯、柱子、平台）。
    ///
    /// 所有 `texture` 参数为 `None` 时退回到构建器的默认纹理。
    #[derive(Debug, Clone)]
    pub struct BrushBuilder {
        default_texture: String,
        steps: StepDimensions,
        strict: bool,
    }

    impl Default for BrushBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl BrushBuilder {
        pub fn new() -> Self {
            Self {
                default_texture: DEFAULT_TEXTURE.to_string(),
                steps: StepDimensions::default(),
                strict: false,
            }
        }

        pub fn with_default_texture(mut self, texture: impl Into<String>) -> Self {
            self.default_texture = texture.into();
            self
        }

        pub fn with_step_dimensions(mut self, steps: StepDimensions) -> Self {
            self.steps = steps;
            self
        }

        /// 严格模式下 `try_*` 系列会拒绝退化输入，否则只记录警告。
        pub fn strict(mut self, strict: bool) -> Self {
            self.strict = strict;
            self
        }

        #[inline]
        pub fn default_texture(&self) -> &str {
            &self.default_texture
        }

        #[inline]
        pub fn step_dimensions(&self) -> StepDimensions {
            self.steps
        }

        #[inline]
        pub fn is_strict(&self) -> bool {
            self.strict
        }

        fn texture<'a>(&'a self, texture: Option<&'a str>) -> &'a str {
            texture.unwrap_or(&self.default_texture)
        }

        /// 生成轴对齐盒体笔刷，平面顺序固定为 上、下、北(+Y)、南(-Y)、东(+X)、西(-X)。
        ///
        /// 角点颠倒时按分量重新排序并记录警告；零体积的盒子原样输出。
        pub fn box_brush(&self, min: Point3, max: Point3, texture: Option<&str>) -> Brush {
            let raw = Bounds3D::new(min, max);
            if raw.is_inverted() {
                warn!(?min, ?max, "盒体角点颠倒，已按分量重新排序");
            }
            let bounds = Bounds3D::from_corners(min, max);
            Brush::new(box_planes(&bounds).to_vec(), self.texture(texture))
        }

        /// 与 [`box_brush`](Self::box_brush) 相同，但严格模式下退化盒体返回错误。
        pub fn try_box_brush(
            &self,
            min: Point3,
            max: Point3,
            texture: Option<&str>,
        ) -> Result<Brush, BuildError> {
            let raw = Bounds3D::new(min, max);
            if raw.is_degenerate() {
                if self.strict {
                    return Err(BuildError::DegenerateBox {
                        min: min.as_vec3().to_array(),
                        max: max.as_vec3().to_array(),
                    });
                }
                warn!(?min, ?max, "盒体笔刷退化，仍按原样生成");
            }
            Ok(self.box_brush(min, max, texture))
        }

        /// 空心房间：地板、天花板与四面墙，共六个笔刷。
        ///
        /// 北/南墙覆盖整个宽度，东/西墙只占内部进深（"画框"式拼接），
        /// 四条竖棱处不会出现重叠的共面几何。墙体在竖直方向上夹在地板与天花板之间。
        pub fn hollow_room(
            &self,
            origin: Point3,
            size: Vector3,
            thickness: f64,
            wall_texture: Option<&str>,
            floor_texture: Option<&str>,
        ) -> Vec<Brush> {
            let o = origin.as_vec3();
            let s = size.as_vec3();
            let t = thickness;
            let wall_bottom = o.z + t;
            let wall_top = o.z + s.z - t;

            let brushes = vec![
                // 地板
                self.box_brush(
                    Point3::new(o.x, o.y, o.z),
                    Point3::new(o.x + s.x, o.y + s.y, o.z + t),
                    floor_texture,
                ),
                // 天花板
                self.box_brush(
                    Point3::new(o.x, o.y, o.z + s.z - t),
                    Point3::new(o.x + s.x, o.y + s.y, o.z + s.z),
                    wall_texture,
                ),
                // 北墙 (+Y)
                self.box_brush(
                    Point3::new(o.x, o.y + s.y - t, wall_bottom),
                    Point3::new(o.x + s.x, o.y + s.y, wall_top),
                    wall_texture,
                ),
                // 南墙 (-Y)
                self.box_brush(
                    Point3::new(o.x, o.y, wall_bottom),
                    Point3::new(o.x + s.x, o.y + t, wall_top),
                    wall_texture,
                ),
                // 西墙 (-X)
                self.box_brush(
                    Point3::new(o.x, o.y + t, wall_bottom),
                    Point3::new(o.x + t, o.y + s.y - t, wall_top),
                    wall_texture,
                ),
                // 东墙 (+X)
                self.box_brush(
                    Point3::new(o.x + s.x - t, o.y + t, wall_bottom),
                    Point3::new(o.x + s.x, o.y + s.y - t, wall_top),
                    wall_texture,
                ),
            ];
            debug!(?origin, ?size, thickness, "生成空心房间");
            brushes
        }

        /// 严格模式下要求墙厚为正且两侧墙体不会在任一轴向上相交。
        pub fn try_hollow_room(
            &self,
            origin: Point3,
            size: Vector3,
            thickness: f64,
            wall_texture: Option<&str>,
            floor_texture: Option<&str>,
        ) -> Result<Vec<Brush>, BuildError> {
            let s = size.as_vec3();
            let fits = thickness > 0.0 && s.min_element() > 2.0 * thickness;
            if !fits {
                if self.strict {
                    return Err(BuildError::InvalidThickness {
                        thickness,
                        size: s.to_array(),
                    });
                }
                warn!(thickness, ?size, "墙厚与房间尺寸不匹配，仍按原样生成");
            }
            Ok(self.hollow_room(origin, size, thickness, wall_texture, floor_texture))
        }

        /// 螺旋楼梯：`steps` 级台阶均分一整圈，每级升高 `height / steps`。
        ///
        /// 台阶中心位于 `origin + radius·(cos θ, sin θ)`；`steps == 0` 时返回空序列。
        pub fn spiral_staircase(
            &self,
            origin: Point3,
            radius: f64,
            height: f64,
            steps: u32,
            texture: Option<&str>,
        ) -> Vec<Brush> {
            if steps == 0 {
                return Vec::new();
            }
            let o = origin.as_vec3();
            let step_height = height / f64::from(steps);
            let angle_per_step = TAU / f64::from(steps);
            let half_width = self.steps.width / 2.0;
            let half_depth = self.steps.depth / 2.0;

            let brushes: Vec<Brush> = (0..steps)
                .map(|index| {
                    let angle = f64::from(index) * angle_per_step;
                    let (sin, cos) = angle.sin_cos();
                    let cx = o.x + radius * cos;
                    let cy = o.y + radius * sin;
                    let z = o.z + f64::from(index) * step_height;
                    self.box_brush(
                        Point3::new(cx - half_width, cy - half_depth, z),
                        Point3::new(cx + half_width, cy + half_depth, z + self.steps.thickness),
                        texture,
                    )
                })
                .collect();
            debug!(?origin, radius, height, steps, "生成螺旋楼梯");
            brushes
        }

        pub fn try_spiral_staircase(
            &self,
            origin: Point3,
            radius: f64,
            height: f64,
            steps: u32,
            texture: Option<&str>,
        ) -> Result<Vec<Brush>, BuildError> {
            if steps == 0 {
                if self.strict {
                    return Err(BuildError::InvalidStepCount);
                }
                warn!("楼梯台阶数为 0，不生成任何笔刷");
            }
            Ok(self.spiral_staircase(origin, radius, height, steps, texture))
        }

        /// 方形截面的柱子。
        pub fn pillar(
            &self,
            origin: Point3,
            width: f64,
            height: f64,
            texture: Option<&str>,
        ) -> Vec<Brush> {
            let o = origin.as_vec3();
            vec![self.box_brush(
                origin,
                Point3::new(o.x + width, o.y + width, o.z + height),
                texture,
            )]
        }

        pub fn try_pillar(
            &self,
            origin: Point3,
            width: f64,
            height: f64,
            texture: Option<&str>,
        ) -> Result<Vec<Brush>, BuildError> {
            let o = origin.as_vec3();
            let brush = self.try_box_brush(
                origin,
                Point3::new(o.x + width, o.y + width, o.z + height),
                texture,
            )?;
            Ok(vec![brush])
        }

        /// 抬高的平台，`footprint` 为 (宽, 深)。
        pub fn platform(
            &self,
            origin: Point3,
            footprint: (f64, f64),
            height: f64,
            texture: Option<&str>,
        ) -> Vec<Brush> {
            let o = origin.as_vec3();
            let (w, d) = footprint;
            vec![self.box_brush(origin, Point3::new(o.x + w, o.y + d, o.z + height), texture)]
        }

        pub fn try_platform(
            &self,
            origin: Point3,
            footprint: (f64, f64),
            height: f64,
            texture: Option<&str>,
        ) -> Result<Vec<Brush>, BuildError> {
            let o = origin.as_vec3();
            let (w, d) = footprint;
            let brush =
                self.try_box_brush(origin, Point3::new(o.x + w, o.y + d, o.z + height), texture)?;
            Ok(vec![brush])
        }
    }

    /// 盒体六个面的三点定义。点序满足 qbsp 的法向约定，法线朝外。
    fn box_planes(bounds: &Bounds3D) -> [Plane; 6] {
        let (x1, y1, z1) = (bounds.min().x(), bounds.min().y(), bounds.min().z());
        let (x2, y2, z2) = (bounds.max().x(), bounds.max().y(), bounds.max().z());
        let p = Point3::new;
        [
            // 上 (+Z)
            Plane::new(p(x1, y2, z2), p(x2, y2, z2), p(x2, y1, z2)),
            // 下 (-Z)
            Plane::new(p(x1, y1, z1), p(x2, y1, z1), p(x2, y2, z1)),
            // 北 (+Y)
            Plane::new(p(x1, y2, z2), p(x1, y2, z1), p(x2, y2, z1)),
            // 南 (-Y)
            Plane::new(p(x2, y1, z2), p(x2, y1, z1), p(x1, y1, z1)),
            // 东 (+X)
            Plane::new(p(x2, y2, z2), p(x2, y2, z1), p(x2, y1, z1)),
            // 西 (-X)
            Plane::new(p(x1, y1, z2), p(x1, y1, z1), p(x1, y2, z1)),
        ]
    }
}

pub use brushes::{BrushBuilder, StepDimensions};
pub use errors::BuildError;
