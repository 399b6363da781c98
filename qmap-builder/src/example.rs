use qmap_core::document::{Entity, MapDocument, WORLDSPAWN};
use qmap_core::geometry::{Point3, Vector3};
use tracing::{debug, info};

use crate::brushes::BrushBuilder;
use crate::errors::BuildError;

const ROOM_SIZE: (f64, f64, f64) = (512.0, 512.0, 256.0);
/// 示例房间的默认墙厚。
pub const DEFAULT_ROOM_THICKNESS: f64 = 16.0;
const PILLAR_ORIGINS: [(f64, f64, f64); 4] = [
    (100.0, 100.0, 16.0),
    (400.0, 100.0, 16.0),
    (100.0, 400.0, 16.0),
    (400.0, 400.0, 16.0),
];

/// 点实体：类名与按顺序写出的属性。
const POINT_ENTITIES: &[(&str, &[(&str, &str)])] = &[
    (
        "info_player_start",
        &[("origin", "256 256 32"), ("angle", "0")],
    ),
    ("light", &[("origin", "256 256 180"), ("light", "300")]),
    ("light", &[("origin", "856 256 180"), ("light", "300")]),
    ("light", &[("origin", "100 100 150"), ("light", "200")]),
    ("light", &[("origin", "400 400 150"), ("light", "200")]),
    ("monster_army", &[("origin", "856 256 32"), ("angle", "180")]),
    ("monster_army", &[("origin", "856 400 32"), ("angle", "180")]),
    ("monster_dog", &[("origin", "700 300 90"), ("angle", "270")]),
    ("weapon_supershotgun", &[("origin", "400 256 32")]),
    ("item_health", &[("origin", "256 400 32")]),
    ("item_shells", &[("origin", "800 450 32")]),
];

/// 示例关卡统计，便于前端打印进度信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleSummary {
    pub world_brushes: usize,
    pub point_entities: usize,
}

/// 构建示例关卡：两个相邻空心房间、主房间内的螺旋楼梯、四根柱子和第二个房间里的平台，
/// 以及玩家出生点、灯光、怪物与道具。
pub fn example_map(
    builder: &BrushBuilder,
    room_thickness: f64,
) -> Result<(MapDocument, ExampleSummary), BuildError> {
    let room_size = Vector3::new(ROOM_SIZE.0, ROOM_SIZE.1, ROOM_SIZE.2);
    let mut world = Vec::new();

    info!("生成地图几何体");
    world.extend(builder.try_hollow_room(
        Point3::new(0.0, 0.0, 0.0),
        room_size,
        room_thickness,
        None,
        None,
    )?);
    // 第二个房间与主房间之间留出 88 单位的间隙，连通需要手工删除墙体。
    world.extend(builder.try_hollow_room(
        Point3::new(600.0, 0.0, 0.0),
        room_size,
        room_thickness,
        None,
        None,
    )?);

    info!("添加螺旋楼梯");
    world.extend(builder.try_spiral_staircase(
        Point3::new(256.0, 256.0, 16.0),
        100.0,
        180.0,
        20,
        None,
    )?);

    info!("添加装饰元素");
    for origin in PILLAR_ORIGINS {
        world.extend(builder.try_pillar(Point3::from(origin), 32.0, 128.0, None)?);
    }
    world.extend(builder.try_platform(
        Point3::new(700.0, 200.0, 16.0),
        (200.0, 150.0),
        64.0,
        None,
    )?);

    let summary = ExampleSummary {
        world_brushes: world.len(),
        point_entities: POINT_ENTITIES.len(),
    };
    debug!(world_brushes = summary.world_brushes, "worldspawn 几何体已就绪");

    let mut document = MapDocument::new();
    document.push(Entity::new(WORLDSPAWN).with_brushes(world));

    info!("添加实体");
    for (classname, properties) in POINT_ENTITIES {
        document.add_entity(*classname, properties.iter().copied(), Vec::new());
    }

    Ok((document, summary))
}
