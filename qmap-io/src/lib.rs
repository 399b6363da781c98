use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use qmap_core::{
    document::{Brush, DEFAULT_TEXTURE, Entity, MapDocument, WORLDSPAWN},
    geometry::{Plane, Point3},
};
use thiserror::Error;
use tracing::{debug, info};

/// 文件头注释，TrenchBroom 依此识别游戏与格式。
pub const HEADER_LINES: [&str; 2] = ["// Game: Quake", "// Format: Standard"];

/// 每个面在纹理名之后的五个字段：x 偏移、y 偏移、旋转、x 缩放、y 缩放。
const FACE_DEFAULTS: &str = "0 0 0 1 1";

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<MapDocument, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, document: &MapDocument, path: &Path) -> Result<(), IoError>;
}

/// Quake 标准 `.map` 文本格式的读写入口。
pub struct MapFacade;

impl MapFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MapFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for MapFacade {
    fn load(&self, path: &Path) -> Result<MapDocument, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let document = parse_map(&data)?;
        debug!(path = %path.display(), entities = document.len(), "读取地图文件");
        Ok(document)
    }
}

impl DocumentSaver for MapFacade {
    /// 截断并重写目标文件。写入中途失败时不回滚，文件可能只写了一部分。
    fn save(&self, document: &MapDocument, path: &Path) -> Result<(), IoError> {
        let to_error = |source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(to_error)?;
        let mut out = BufWriter::new(file);
        write_map(document, &mut out).map_err(to_error)?;
        out.flush().map_err(to_error)?;
        info!(
            path = %path.display(),
            entities = document.len(),
            brushes = document.brush_count(),
            "地图文件已写出"
        );
        Ok(())
    }
}

/// 按 Quake 标准格式写出文档，直接流式写入 `out`。
pub fn write_map<W: Write>(document: &MapDocument, out: &mut W) -> std::io::Result<()> {
    write!(out, "{}", MapText::new(document))
}

/// 生成完整的地图文本，便于预览或测试。
pub fn map_to_string(document: &MapDocument) -> String {
    MapText::new(document).to_string()
}

/// 文档的 `.map` 文本视图。
///
/// `worldspawn` 总是作为 `entity 0` 最先写出（只包含第一个该类实体的笔刷），
/// 其余实体按插入顺序从 1 开始连续编号。
pub struct MapText<'a> {
    document: &'a MapDocument,
}

impl<'a> MapText<'a> {
    pub fn new(document: &'a MapDocument) -> Self {
        Self { document }
    }
}

impl fmt::Display for MapText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in HEADER_LINES {
            writeln!(f, "{line}")?;
        }

        writeln!(f, "// entity 0")?;
        writeln!(f, "{{")?;
        writeln!(f, "\"classname\" \"{WORLDSPAWN}\"")?;
        if let Some(world) = self.document.worldspawn() {
            for brush in &world.brushes {
                write_brush(brush, f)?;
            }
        }
        writeln!(f, "}}")?;

        for (index, entity) in self.document.point_entities().enumerate() {
            writeln!(f, "// entity {}", index + 1)?;
            writeln!(f, "{{")?;
            writeln!(f, "\"classname\" \"{}\"", entity.classname)?;
            for (key, value) in &entity.properties {
                writeln!(f, "\"{key}\" \"{value}\"")?;
            }
            for brush in &entity.brushes {
                write_brush(brush, f)?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

fn write_brush(brush: &Brush, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{{")?;
    for plane in &brush.planes {
        for point in plane.points() {
            let [x, y, z] = point.truncated();
            write!(f, "( {x} {y} {z} ) ")?;
        }
        writeln!(f, "{} {FACE_DEFAULTS}", brush.texture)?;
    }
    writeln!(f, "}}")
}

/// 解析标准格式的 `.map` 文本。实体按文件中的顺序追加到文档。
pub fn parse_map(source: &str) -> Result<MapDocument, IoError> {
    MapParser::new(source).parse().map_err(|err| match err {
        MapError::Unsupported { feature } => IoError::UnsupportedFeature(feature),
        MapError::Invalid { message } => IoError::InvalidDocument(message),
    })
}

#[derive(Debug)]
enum MapError {
    Unsupported { feature: String },
    Invalid { message: String },
}

impl MapError {
    fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

struct MapParser<'a> {
    reader: MapReader<'a>,
}

impl<'a> MapParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: MapReader::new(source),
        }
    }

    fn parse(mut self) -> Result<MapDocument, MapError> {
        let mut document = MapDocument::new();
        while let Some((line_number, line)) = self.reader.next_line() {
            if line != "{" {
                return Err(MapError::invalid(format!(
                    "第 {line_number} 行出现意外内容 \"{line}\"（期望实体起始 `{{`）"
                )));
            }
            let entity = self.parse_entity(line_number)?;
            document.push(entity);
        }
        Ok(document)
    }

    fn parse_entity(&mut self, start_line: usize) -> Result<Entity, MapError> {
        let mut classname: Option<String> = None;
        let mut entity = Entity::new(String::new());
        loop {
            let Some((line_number, line)) = self.reader.next_line() else {
                return Err(MapError::invalid(format!(
                    "第 {start_line} 行开始的实体缺少结束符 `}}`"
                )));
            };
            match line {
                "}" => break,
                "{" => {
                    let brush = self.parse_brush(line_number)?;
                    entity.brushes.push(brush);
                }
                _ if line.starts_with('"') => {
                    let (key, value) = parse_key_value(line, line_number)?;
                    if key == "classname" && classname.is_none() {
                        classname = Some(value);
                    } else {
                        entity.properties.insert(key, value);
                    }
                }
                _ => {
                    return Err(MapError::invalid(format!(
                        "第 {line_number} 行无法识别：\"{line}\""
                    )));
                }
            }
        }
        entity.classname = classname.ok_or_else(|| {
            MapError::invalid(format!("第 {start_line} 行开始的实体缺少 classname"))
        })?;
        Ok(entity)
    }

    fn parse_brush(&mut self, start_line: usize) -> Result<Brush, MapError> {
        let mut planes = Vec::new();
        let mut texture: Option<String> = None;
        loop {
            let Some((line_number, line)) = self.reader.next_line() else {
                return Err(MapError::invalid(format!(
                    "第 {start_line} 行开始的笔刷缺少结束符 `}}`"
                )));
            };
            if line == "}" {
                break;
            }
            let (plane, face_texture) = parse_plane(line, line_number)?;
            planes.push(plane);
            if texture.is_none() {
                texture = Some(face_texture.to_string());
            }
        }
        Ok(Brush::new(
            planes,
            texture.unwrap_or_else(|| DEFAULT_TEXTURE.to_string()),
        ))
    }
}

/// 逐行读取，跳过空行与 `//` 注释，并记录 1 起始的行号。
struct MapReader<'a> {
    lines: std::str::Lines<'a>,
    line_number: usize,
}

impl<'a> MapReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            line_number: 0,
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        for line in self.lines.by_ref() {
            self.line_number += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            return Some((self.line_number, trimmed));
        }
        None
    }
}

fn parse_key_value(line: &str, line_number: usize) -> Result<(String, String), MapError> {
    let parts: Vec<&str> = line.split('"').collect();
    // `"key" "value"` 按引号切分后为 ["", key, " ", value, ""]
    let well_formed = parts.len() == 5
        && parts[0].is_empty()
        && parts[2].trim().is_empty()
        && parts[4].trim().is_empty();
    if !well_formed {
        return Err(MapError::invalid(format!(
            "第 {line_number} 行的属性格式错误：{line}"
        )));
    }
    Ok((parts[1].to_string(), parts[3].to_string()))
}

fn parse_plane(line: &str, line_number: usize) -> Result<(Plane, &str), MapError> {
    if line.contains('[') {
        return Err(MapError::unsupported(format!(
            "第 {line_number} 行使用了 Valve 220 纹理轴格式"
        )));
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 21 {
        return Err(MapError::invalid(format!(
            "第 {line_number} 行的平面定义需要 21 个记号，实际为 {}",
            tokens.len()
        )));
    }

    let mut points = [Point3::new(0.0, 0.0, 0.0); 3];
    for (slot, chunk) in points.iter_mut().zip(tokens[..15].chunks(5)) {
        if chunk[0] != "(" || chunk[4] != ")" {
            return Err(MapError::invalid(format!(
                "第 {line_number} 行的平面点缺少括号"
            )));
        }
        *slot = Point3::new(
            parse_f64(chunk[1], line_number)?,
            parse_f64(chunk[2], line_number)?,
            parse_f64(chunk[3], line_number)?,
        );
    }

    let texture = tokens[15];
    for raw in &tokens[16..] {
        parse_f64(raw, line_number)?;
    }
    Ok((Plane::new(points[0], points[1], points[2]), texture))
}

fn parse_f64(raw: &str, line_number: usize) -> Result<f64, MapError> {
    raw.parse::<f64>().map_err(|_| {
        MapError::invalid(format!("第 {line_number} 行的数值 \"{raw}\" 无法解析"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_brush() -> Brush {
        let p = Point3::new;
        Brush::new(
            vec![Plane::new(p(0.0, 64.0, 32.0), p(64.0, 64.0, 32.0), p(64.0, 0.0, 32.0))],
            "WBRICK1_5",
        )
    }

    #[test]
    fn empty_document_writes_header_and_empty_worldspawn() {
        let text = map_to_string(&MapDocument::new());
        assert_eq!(
            text,
            "// Game: Quake\n// Format: Standard\n// entity 0\n{\n\"classname\" \"worldspawn\"\n}\n"
        );
    }

    #[test]
    fn streamed_output_matches_string_rendering() {
        let mut doc = MapDocument::new();
        doc.add_entity(WORLDSPAWN, Vec::<(String, String)>::new(), vec![unit_brush()]);
        doc.add_entity("light", [("light", "300")], Vec::new());

        let mut streamed = Vec::new();
        write_map(&doc, &mut streamed).expect("写入内存缓冲失败");
        assert_eq!(String::from_utf8(streamed).expect("UTF-8"), map_to_string(&doc));
        assert_eq!(MapText::new(&doc).to_string(), map_to_string(&doc));
    }

    #[test]
    fn plane_line_truncates_coordinates() {
        let p = Point3::new;
        let brush = Brush::new(
            vec![Plane::new(p(1.9, -2.9, 3.5), p(0.1, 0.0, -0.7), p(100.99, 7.0, 8.0))],
            "SKY1",
        );
        let mut doc = MapDocument::new();
        doc.add_entity(WORLDSPAWN, Vec::<(String, String)>::new(), vec![brush]);
        let text = map_to_string(&doc);
        assert!(
            text.contains("{\n( 1 -2 3 ) ( 0 0 0 ) ( 100 7 8 ) SKY1 0 0 0 1 1\n}\n"),
            "{text}"
        );
    }

    #[test]
    fn worldspawn_is_written_first_and_others_are_numbered() {
        let mut doc = MapDocument::new();
        doc.add_entity("light", [("light", "300")], Vec::new());
        doc.add_entity(WORLDSPAWN, Vec::<(String, String)>::new(), vec![unit_brush()]);
        doc.add_entity("info_player_start", [("origin", "0 0 24")], Vec::new());
        let text = map_to_string(&doc);

        let world = text.find("\"classname\" \"worldspawn\"").expect("worldspawn");
        let light = text.find("\"classname\" \"light\"").expect("light");
        assert!(world < light);
        assert!(text.contains("// entity 1\n{\n\"classname\" \"light\"\n\"light\" \"300\"\n}\n"));
        assert!(text.contains(
            "// entity 2\n{\n\"classname\" \"info_player_start\"\n\"origin\" \"0 0 24\"\n}\n"
        ));
        assert!(!text.contains("// entity 3"));
    }

    #[test]
    fn parse_reads_entities_properties_and_brushes() {
        let source = "\
// Game: Quake
// Format: Standard
// entity 0
{
\"classname\" \"worldspawn\"
\"wad\" \"quake.wad\"
{
( 0 64 32 ) ( 64 64 32 ) ( 64 0 32 ) WBRICK1_5 0 0 0 1 1
( 0 0 0 ) ( 64 0 0 ) ( 64 64 0 ) CITY4_6 0 0 0 1 1
}
}
// entity 1
{
\"classname\" \"light\"
\"origin\" \"32 32 48\"
\"light\" \"250\"
}
";
        let doc = parse_map(source).expect("parse");
        assert_eq!(doc.len(), 2);
        let world = doc.worldspawn().expect("worldspawn");
        assert_eq!(world.property("wad"), Some("quake.wad"));
        assert_eq!(world.brushes.len(), 1);
        assert_eq!(world.brushes[0].plane_count(), 2);
        assert_eq!(world.brushes[0].texture, "WBRICK1_5");

        let light = doc.point_entities().next().expect("light");
        let keys: Vec<&str> = light.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["origin", "light"]);
    }

    #[test]
    fn parse_reports_line_numbers() {
        let err = parse_map("{\n\"classname\" \"light\"\n( 0 0 0 )\n}\n").unwrap_err();
        match err {
            IoError::InvalidDocument(message) => assert!(message.contains("第 3 行"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_rejects_unterminated_entity_and_missing_classname() {
        assert!(matches!(
            parse_map("{\n\"classname\" \"light\"\n"),
            Err(IoError::InvalidDocument(_))
        ));
        assert!(matches!(
            parse_map("{\n\"origin\" \"0 0 0\"\n}\n"),
            Err(IoError::InvalidDocument(_))
        ));
    }

    #[test]
    fn valve_format_is_unsupported() {
        let source = "{\n\"classname\" \"worldspawn\"\n{\n( 0 0 0 ) ( 1 0 0 ) ( 0 1 0 ) T [ 1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1\n}\n}\n";
        assert!(matches!(
            parse_map(source),
            Err(IoError::UnsupportedFeature(_))
        ));
    }
}
