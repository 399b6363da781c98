pub mod geometry {
    use glam::DVec3;
    use serde::{Deserialize, Serialize};

    /// 三维点，内部以 `glam::DVec3` 表示。写出时才截断为整数。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn from_vec(vec: DVec3) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn vector_to(self, other: Point3) -> Vector3 {
            Vector3(other.0 - self.0)
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        /// 向零截断的整数坐标（与 `.map` 文件写出规则一致，不做四舍五入）。
        ///
        /// 沿用 `as` 转换语义：NaN 变为 0，±∞ 与超出范围的值饱和到 `i64` 边界。
        /// 退化坐标不会被拒绝，照常写出。
        #[inline]
        pub fn truncated(self) -> [i64; 3] {
            [self.0.x as i64, self.0.y as i64, self.0.z as i64]
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    impl From<(f64, f64, f64)> for Point3 {
        fn from((x, y, z): (f64, f64, f64)) -> Self {
            Self::new(x, y, z)
        }
    }

    /// 三维向量，主要用于平面法向计算。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector3(pub DVec3);

    impl Vector3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn normalize(self) -> Option<Self> {
            let len = self.0.length();
            if len <= f64::EPSILON {
                None
            } else {
                Some(Self(self.0 / len))
            }
        }

        #[inline]
        pub fn cross(self, other: Vector3) -> Vector3 {
            Self(self.0.cross(other.0))
        }
    }

    impl From<DVec3> for Vector3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 轴对齐包围盒。既用于描述盒体笔刷的两个角点，也用于估算笔刷范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds3D {
        min: Point3,
        max: Point3,
    }

    impl Bounds3D {
        /// 原样保存两个角点，不做排序。
        #[inline]
        pub fn new(min: Point3, max: Point3) -> Self {
            Self { min, max }
        }

        /// 按分量取最小/最大值，得到规范化的包围盒。
        #[inline]
        pub fn from_corners(a: Point3, b: Point3) -> Self {
            Self {
                min: Point3::from_vec(a.as_vec3().min(b.as_vec3())),
                max: Point3::from_vec(a.as_vec3().max(b.as_vec3())),
            }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
                max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y() || self.min.z() > self.max.z()
        }

        /// 任一轴向尺寸不为正即视为退化（零体积或角点颠倒）。
        #[inline]
        pub fn is_degenerate(&self) -> bool {
            let size = self.size();
            size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0
        }

        /// 角点是否存在某一轴 min > max 的颠倒情况。
        #[inline]
        pub fn is_inverted(&self) -> bool {
            self.is_empty()
        }

        #[inline]
        pub fn min(&self) -> Point3 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point3 {
            self.max
        }

        #[inline]
        pub fn size(&self) -> DVec3 {
            self.max.as_vec3() - self.min.as_vec3()
        }

        pub fn include_point(&mut self, point: Point3) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            self.min = Point3::from_vec(self.min.as_vec3().min(point.as_vec3()));
            self.max = Point3::from_vec(self.max.as_vec3().max(point.as_vec3()));
        }

        #[inline]
        pub fn center(&self) -> Point3 {
            debug_assert!(!self.is_empty());
            Point3::from_vec((self.min.as_vec3() + self.max.as_vec3()) * 0.5)
        }
    }

    /// `.map` 中的平面：三个边界点，从实体外侧看按逆时针排列。
    ///
    /// qbsp 以 `(p1 - p2) × (p3 - p2)` 推导平面法向，因此点序决定外法线方向。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Plane {
        points: [Point3; 3],
    }

    impl Plane {
        #[inline]
        pub fn new(p1: Point3, p2: Point3, p3: Point3) -> Self {
            Self {
                points: [p1, p2, p3],
            }
        }

        #[inline]
        pub fn points(&self) -> &[Point3; 3] {
            &self.points
        }

        /// 由点序推导的法向（未归一化）。三点共线时返回 `None`。
        pub fn normal(&self) -> Option<Vector3> {
            let [p1, p2, p3] = self.points;
            let normal = p2.vector_to(p1).cross(p2.vector_to(p3));
            if normal.length_squared() <= f64::EPSILON {
                None
            } else {
                Some(normal)
            }
        }
    }
}

pub mod document {
    use indexmap::IndexMap;
    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds3D, Plane};

    /// 聚合全部静态几何的保留类名。
    pub const WORLDSPAWN: &str = "worldspawn";

    /// 默认纹理名，对应 TrenchBroom 的空纹理占位。
    pub const DEFAULT_TEXTURE: &str = "__TB_empty";

    /// 凸体笔刷：若干平面加一个统一纹理。盒体笔刷恰好六个平面。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Brush {
        pub planes: Vec<Plane>,
        pub texture: String,
    }

    impl Brush {
        #[inline]
        pub fn new(planes: Vec<Plane>, texture: impl Into<String>) -> Self {
            Self {
                planes,
                texture: texture.into(),
            }
        }

        #[inline]
        pub fn plane_count(&self) -> usize {
            self.planes.len()
        }

        /// 所有平面点的包围盒。
        pub fn bounds(&self) -> Option<Bounds3D> {
            let mut bounds = Bounds3D::empty();
            for plane in &self.planes {
                for point in plane.points() {
                    bounds.include_point(*point);
                }
            }
            if bounds.is_empty() {
                None
            } else {
                Some(bounds)
            }
        }
    }

    /// 实体：类名、按插入顺序保存的属性表以及所拥有的笔刷。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Entity {
        pub classname: String,
        pub properties: IndexMap<String, String>,
        pub brushes: Vec<Brush>,
    }

    impl Entity {
        #[inline]
        pub fn new(classname: impl Into<String>) -> Self {
            Self {
                classname: classname.into(),
                properties: IndexMap::new(),
                brushes: Vec::new(),
            }
        }

        pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
            self.properties.insert(key.into(), value.into());
            self
        }

        pub fn with_brushes(mut self, brushes: impl IntoIterator<Item = Brush>) -> Self {
            self.brushes.extend(brushes);
            self
        }

        #[inline]
        pub fn is_worldspawn(&self) -> bool {
            self.classname == WORLDSPAWN
        }

        #[inline]
        pub fn property(&self, key: &str) -> Option<&str> {
            self.properties.get(key).map(String::as_str)
        }
    }

    /// 待写出的地图文档。实体只追加，写出时才决定排序。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct MapDocument {
        entities: Vec<Entity>,
    }

    impl MapDocument {
        pub fn new() -> Self {
            Self::default()
        }

        /// 追加实体。类名与属性键均不做校验，原样接收。
        pub fn add_entity<K, V>(
            &mut self,
            classname: impl Into<String>,
            properties: impl IntoIterator<Item = (K, V)>,
            brushes: Vec<Brush>,
        ) where
            K: Into<String>,
            V: Into<String>,
        {
            let properties = properties
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect();
            self.entities.push(Entity {
                classname: classname.into(),
                properties,
                brushes,
            });
        }

        #[inline]
        pub fn push(&mut self, entity: Entity) {
            self.entities.push(entity);
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &Entity> {
            self.entities.iter()
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.entities.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.entities.is_empty()
        }

        /// 第一个类名为 `worldspawn` 的实体；后续同名实体按普通实体处理。
        pub fn worldspawn(&self) -> Option<&Entity> {
            self.entities.iter().find(|entity| entity.is_worldspawn())
        }

        /// 除聚合实体外的全部实体，保持插入顺序。
        pub fn point_entities(&self) -> impl Iterator<Item = &Entity> {
            self.entities.iter().filter(|entity| !entity.is_worldspawn())
        }

        pub fn brush_count(&self) -> usize {
            self.entities.iter().map(|entity| entity.brushes.len()).sum()
        }
    }
}
