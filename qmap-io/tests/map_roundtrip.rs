use std::fs;

use qmap_builder::BrushBuilder;
use qmap_builder::example::{DEFAULT_ROOM_THICKNESS, example_map};
use qmap_core::document::{MapDocument, WORLDSPAWN};
use qmap_core::geometry::Point3;
use qmap_io::{DocumentLoader, DocumentSaver, IoError, MapFacade, map_to_string};

fn plane_triples(text: &str) -> Vec<[[i64; 3]; 3]> {
    text.lines()
        .filter(|line| line.starts_with('('))
        .map(|line| {
            let numbers: Vec<i64> = line
                .split_whitespace()
                .filter_map(|token| token.parse::<i64>().ok())
                .collect();
            // 9 个坐标 + 5 个纹理字段
            assert_eq!(numbers.len(), 14, "平面行记号数量异常: {line}");
            [
                [numbers[0], numbers[1], numbers[2]],
                [numbers[3], numbers[4], numbers[5]],
                [numbers[6], numbers[7], numbers[8]],
            ]
        })
        .collect()
}

#[test]
fn box_brush_round_trips_through_file() {
    let builder = BrushBuilder::new();
    let min = Point3::new(-32.7, 8.2, 0.0);
    let max = Point3::new(64.9, 128.5, 48.99);
    let brush = builder.box_brush(min, max, None);

    let mut document = MapDocument::new();
    document.add_entity(WORLDSPAWN, Vec::<(String, String)>::new(), vec![brush.clone()]);

    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("box.map");
    let facade = MapFacade::new();
    facade.save(&document, &path).expect("写出地图失败");

    let text = fs::read_to_string(&path).expect("读取地图失败");
    let triples = plane_triples(&text);
    assert_eq!(triples.len(), 6);

    let expected: Vec<[[i64; 3]; 3]> = brush
        .planes
        .iter()
        .map(|plane| {
            let [a, b, c] = plane.points();
            [a.truncated(), b.truncated(), c.truncated()]
        })
        .collect();
    assert_eq!(triples, expected);

    // 每个坐标都来自截断后的角点集合。
    let xs = [-32, 64];
    let ys = [8, 128];
    let zs = [0, 48];
    for triple in &triples {
        for [x, y, z] in triple {
            assert!(xs.contains(x) && ys.contains(y) && zs.contains(z), "{triple:?}");
        }
    }

    let loaded = facade.load(&path).expect("重新读取地图失败");
    let world = loaded.worldspawn().expect("缺少 worldspawn");
    assert_eq!(world.brushes.len(), 1);
    assert_eq!(world.brushes[0].plane_count(), 6);
    assert_eq!(world.brushes[0].texture, brush.texture);
}

#[test]
fn worldspawn_written_first_even_when_added_last() {
    let mut document = MapDocument::new();
    document.add_entity("light", [("origin", "0 0 64"), ("light", "300")], Vec::new());
    document.add_entity("info_player_start", [("origin", "0 0 24")], Vec::new());
    document.add_entity(WORLDSPAWN, Vec::<(String, String)>::new(), Vec::new());

    let text = map_to_string(&document);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        &lines[..6],
        &[
            "// Game: Quake",
            "// Format: Standard",
            "// entity 0",
            "{",
            "\"classname\" \"worldspawn\"",
            "}",
        ]
    );
    assert_eq!(lines[6], "// entity 1");
    assert_eq!(lines[8], "\"classname\" \"light\"");

    let loaded = qmap_io::parse_map(&text).expect("解析失败");
    let classes: Vec<&str> = loaded
        .entities()
        .map(|entity| entity.classname.as_str())
        .collect();
    assert_eq!(classes, vec!["worldspawn", "light", "info_player_start"]);
}

#[test]
fn example_map_file_is_numbered_and_reproducible() {
    let builder = BrushBuilder::new();
    let (document, summary) = example_map(&builder, DEFAULT_ROOM_THICKNESS).expect("构建示例地图失败");

    let first = map_to_string(&document);
    let second = map_to_string(&document);
    assert_eq!(first, second);

    let numbers: Vec<usize> = first
        .lines()
        .filter_map(|line| line.strip_prefix("// entity "))
        .map(|raw| raw.parse().expect("实体编号"))
        .collect();
    let expected: Vec<usize> = (0..=summary.point_entities).collect();
    assert_eq!(numbers, expected);
    assert_eq!(plane_triples(&first).len(), summary.world_brushes * 6);

    let reparsed = qmap_io::parse_map(&first).expect("解析示例地图失败");
    assert_eq!(reparsed.brush_count(), 37);
    assert_eq!(reparsed.len(), 12);
}

#[test]
fn save_into_missing_directory_fails_with_write_error() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("missing").join("out.map");
    let err = MapFacade::new()
        .save(&MapDocument::new(), &path)
        .unwrap_err();
    match err {
        IoError::WriteError { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("期望 WriteError，实际为 {other}"),
    }
}

#[test]
fn save_truncates_existing_file() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("old.map");
    fs::write(&path, "x".repeat(4096)).expect("写入旧文件失败");

    MapFacade::new()
        .save(&MapDocument::new(), &path)
        .expect("写出地图失败");
    let text = fs::read_to_string(&path).expect("读取地图失败");
    assert!(!text.contains('x'));
    assert!(text.ends_with("}\n"));
}

#[test]
fn load_missing_file_fails_with_read_error() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let err = MapFacade::new()
        .load(&dir.path().join("nope.map"))
        .unwrap_err();
    assert!(matches!(err, IoError::ReadError { .. }));
}
