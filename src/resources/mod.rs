//! 启动期资源加载
//!
//! 所有读取都在进入帧循环之前完成，允许阻塞。

pub mod bitmap;
pub mod obj;
pub mod stl;

pub use bitmap::{load_bitmap, Bitmap};
pub use obj::{load_obj, ObjModel};
pub use stl::{load_stl, Triangle};

use crate::core::error::{AssetError, AssetResult};
use std::path::Path;

/// 按扩展名加载的模型
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedModel {
    Stl(Vec<Triangle>),
    Obj(ObjModel),
}

/// 根据扩展名选择 STL 或 OBJ 读取器
pub fn load_model(path: &Path) -> AssetResult<LoadedModel> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("stl") => Ok(LoadedModel::Stl(load_stl(path)?)),
        Some("obj") => Ok(LoadedModel::Obj(load_obj(path)?)),
        _ => Err(AssetError::InvalidFormat {
            path: path.display().to_string(),
            expected: "stl or obj".to_string(),
        }),
    }
}

pub(crate) fn read_asset(path: &Path) -> AssetResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AssetError::NotFound {
            path: path.display().to_string(),
        },
        _ => AssetError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    })
}
