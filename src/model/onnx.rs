// ============================================================================
// ONNX RUNTIME BACKEND — promptable segmentation via dynamic loading
// ============================================================================
//
// ONNX Runtime is loaded at runtime with `libloading`, so the binary has no
// compile-time dependency on it: the absence of the shared library or the
// model weights simply makes the service unavailable and the engine falls
// back to the rule-based strategies.
//
// The OrtApi is a C struct of ~200 function pointers; we load the whole
// vtable and index into it for the handful of functions we need. Indices
// come from onnxruntime_c_api.h and are stable for API version 18
// (ONNX Runtime >= 1.16).
//
// Two sessions: an image encoder producing the embedding tensor, and a
// prompt decoder mapping (embedding, click point) to ranked masks with IoU
// scores. Both load lazily, at most once per process.

#![allow(clippy::missing_safety_doc)]

use std::ffi::{c_char, c_void, CString};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use image::{GrayImage, RgbImage};
use log::info;

use super::{Embedding, MaskCandidate, PromptSegmenter};
use crate::error::EngineError;
use crate::mask::FG;

/// Side length both models were exported for.
const MODEL_INPUT_SIZE: u32 = 1024;
/// Per-channel pixel normalization (mean, std) used by the encoder export.
const PIXEL_MEAN: [f32; 3] = [123.675, 116.28, 103.53];
const PIXEL_STD: [f32; 3] = [58.395, 57.12, 57.375];
/// ORT C API version we target.
const ORT_API_VERSION: u32 = 18;

/// Decoder tensor names from the reference export.
const IN_EMBEDDINGS: &str = "image_embeddings";
const IN_POINT_COORDS: &str = "point_coords";
const IN_POINT_LABELS: &str = "point_labels";
const IN_MASK_INPUT: &str = "mask_input";
const IN_HAS_MASK: &str = "has_mask_input";
const IN_ORIG_SIZE: &str = "orig_im_size";
const OUT_MASKS: &str = "masks";
const OUT_SCORES: &str = "iou_predictions";

#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// onnxruntime shared library (.so / .dll / .dylib).
    pub runtime: PathBuf,
    /// Image encoder .onnx.
    pub encoder: PathBuf,
    /// Point-prompt decoder .onnx.
    pub decoder: PathBuf,
}

/// Reject paths that could load native code from somewhere unexpected:
/// must be absolute, free of `..` components, and carry the right extension.
pub fn validate_model_path(path: &Path, for_library: bool) -> Result<(), String> {
    if path.as_os_str().is_empty() {
        return Err("path is empty".into());
    }
    if !path.is_absolute() {
        return Err(format!("{} must be an absolute path", path.display()));
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(format!("{} must not contain '..' components", path.display()));
    }
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
    if for_library {
        if !["so", "dll", "dylib"].contains(&ext.as_str()) {
            return Err(format!("expected a .so/.dll/.dylib file, got '.{}'", ext));
        }
    } else if ext != "onnx" {
        return Err(format!("expected a .onnx model file, got '.{}'", ext));
    }
    Ok(())
}

// ============================================================================
// Raw C API surface
// ============================================================================

#[repr(C)]
struct OrtEnv {
    _private: [u8; 0],
}
#[repr(C)]
struct OrtSession {
    _private: [u8; 0],
}
#[repr(C)]
struct OrtSessionOptions {
    _private: [u8; 0],
}
#[repr(C)]
struct OrtValue {
    _private: [u8; 0],
}
#[repr(C)]
struct OrtMemoryInfo {
    _private: [u8; 0],
}
#[repr(C)]
struct OrtStatus {
    _private: [u8; 0],
}
#[repr(C)]
struct OrtRunOptions {
    _private: [u8; 0],
}
#[repr(C)]
struct OrtTensorTypeAndShapeInfo {
    _private: [u8; 0],
}

#[repr(C)]
struct OrtApiBase {
    get_api: unsafe extern "C" fn(version: u32) -> *const c_void,
    get_version_string: unsafe extern "C" fn() -> *const c_char,
}

/// Path character type of the C API: wide on Windows, narrow elsewhere.
#[cfg(windows)]
type OrtChar = u16;
#[cfg(not(windows))]
type OrtChar = c_char;

#[cfg(windows)]
fn to_ort_chars(path: &Path) -> Vec<OrtChar> {
    use std::os::windows::ffi::OsStrExt;
    path.as_os_str().encode_wide().chain(std::iter::once(0)).collect()
}

#[cfg(not(windows))]
fn to_ort_chars(path: &Path) -> Vec<OrtChar> {
    let bytes = path.to_string_lossy().into_owned().into_bytes();
    bytes.into_iter().map(|b| b as OrtChar).chain(std::iter::once(0)).collect()
}

type CreateEnvFn =
    unsafe extern "C" fn(log_level: u32, logid: *const c_char, out: *mut *mut OrtEnv) -> *mut OrtStatus;
type CreateSessionOptionsFn = unsafe extern "C" fn(out: *mut *mut OrtSessionOptions) -> *mut OrtStatus;
type CreateSessionFn = unsafe extern "C" fn(
    env: *const OrtEnv,
    model_path: *const OrtChar,
    options: *const OrtSessionOptions,
    out: *mut *mut OrtSession,
) -> *mut OrtStatus;
type RunFn = unsafe extern "C" fn(
    session: *mut OrtSession,
    run_options: *const OrtRunOptions,
    input_names: *const *const c_char,
    inputs: *const *const OrtValue,
    input_count: usize,
    output_names: *const *const c_char,
    output_count: usize,
    outputs: *mut *mut OrtValue,
) -> *mut OrtStatus;
type CreateTensorFn = unsafe extern "C" fn(
    info: *const OrtMemoryInfo,
    data: *mut c_void,
    data_len: usize,
    shape: *const i64,
    shape_len: usize,
    element_type: u32,
    out: *mut *mut OrtValue,
) -> *mut OrtStatus;
type CreateCpuMemoryInfoFn =
    unsafe extern "C" fn(alloc_type: i32, mem_type: i32, out: *mut *mut OrtMemoryInfo) -> *mut OrtStatus;
type GetTensorDataFn =
    unsafe extern "C" fn(value: *mut OrtValue, out: *mut *mut c_void) -> *mut OrtStatus;
type GetShapeInfoFn = unsafe extern "C" fn(
    value: *const OrtValue,
    out: *mut *mut OrtTensorTypeAndShapeInfo,
) -> *mut OrtStatus;
type GetDimCountFn =
    unsafe extern "C" fn(info: *const OrtTensorTypeAndShapeInfo, out: *mut usize) -> *mut OrtStatus;
type GetDimsFn = unsafe extern "C" fn(
    info: *const OrtTensorTypeAndShapeInfo,
    dims: *mut i64,
    dims_len: usize,
) -> *mut OrtStatus;
type SetThreadsFn =
    unsafe extern "C" fn(options: *mut OrtSessionOptions, threads: i32) -> *mut OrtStatus;
type SetOptLevelFn =
    unsafe extern "C" fn(options: *mut OrtSessionOptions, level: u32) -> *mut OrtStatus;
type GetErrorMessageFn = unsafe extern "C" fn(status: *const OrtStatus) -> *const c_char;
type ReleaseEnvFn = unsafe extern "C" fn(env: *mut OrtEnv);
type ReleaseSessionFn = unsafe extern "C" fn(session: *mut OrtSession);
type ReleaseSessionOptionsFn = unsafe extern "C" fn(options: *mut OrtSessionOptions);
type ReleaseValueFn = unsafe extern "C" fn(value: *mut OrtValue);
type ReleaseMemoryInfoFn = unsafe extern "C" fn(info: *mut OrtMemoryInfo);
type ReleaseShapeInfoFn = unsafe extern "C" fn(info: *mut OrtTensorTypeAndShapeInfo);
type ReleaseStatusFn = unsafe extern "C" fn(status: *mut OrtStatus);

/// ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT
const TENSOR_F32: u32 = 1;
/// OrtArenaAllocator, OrtMemTypeDefault
const ARENA_ALLOCATOR: i32 = 1;
const MEM_TYPE_DEFAULT: i32 = 0;
/// ORT_ENABLE_ALL
const OPT_ENABLE_ALL: u32 = 99;
/// ORT_LOGGING_LEVEL_WARNING
const LOG_WARNING: u32 = 2;

/// Function-pointer vtable, indexed per onnxruntime_c_api.h:
///  2 GetErrorMessage, 3 CreateEnv, 7 CreateSession, 9 Run,
/// 10 CreateSessionOptions, 23 SetSessionGraphOptimizationLevel,
/// 24 SetIntraOpNumThreads, 49 CreateTensorWithDataAsOrtValue,
/// 51 GetTensorMutableData, 61 GetDimensionsCount, 62 GetDimensions,
/// 65 GetTensorTypeAndShape, 69 CreateCpuMemoryInfo, 92 ReleaseEnv,
/// 93 ReleaseStatus, 94 ReleaseMemoryInfo, 95 ReleaseSession,
/// 96 ReleaseValue, 99 ReleaseTensorTypeAndShapeInfo,
/// 100 ReleaseSessionOptions.
struct OrtApi {
    raw: *const c_void,
}

impl OrtApi {
    unsafe fn get_fn<T>(&self, index: usize) -> T {
        let table = self.raw as *const *const c_void;
        let ptr = *table.add(index);
        std::mem::transmute_copy(&ptr)
    }

    fn get_error_message(&self) -> GetErrorMessageFn {
        unsafe { self.get_fn(2) }
    }
    fn create_env(&self) -> CreateEnvFn {
        unsafe { self.get_fn(3) }
    }
    fn create_session(&self) -> CreateSessionFn {
        unsafe { self.get_fn(7) }
    }
    fn run(&self) -> RunFn {
        unsafe { self.get_fn(9) }
    }
    fn create_session_options(&self) -> CreateSessionOptionsFn {
        unsafe { self.get_fn(10) }
    }
    fn set_opt_level(&self) -> SetOptLevelFn {
        unsafe { self.get_fn(23) }
    }
    fn set_intra_threads(&self) -> SetThreadsFn {
        unsafe { self.get_fn(24) }
    }
    fn create_tensor(&self) -> CreateTensorFn {
        unsafe { self.get_fn(49) }
    }
    fn get_tensor_data(&self) -> GetTensorDataFn {
        unsafe { self.get_fn(51) }
    }
    fn get_dim_count(&self) -> GetDimCountFn {
        unsafe { self.get_fn(61) }
    }
    fn get_dims(&self) -> GetDimsFn {
        unsafe { self.get_fn(62) }
    }
    fn get_shape_info(&self) -> GetShapeInfoFn {
        unsafe { self.get_fn(65) }
    }
    fn create_cpu_memory_info(&self) -> CreateCpuMemoryInfoFn {
        unsafe { self.get_fn(69) }
    }
    fn release_env(&self) -> ReleaseEnvFn {
        unsafe { self.get_fn(92) }
    }
    fn release_status(&self) -> ReleaseStatusFn {
        unsafe { self.get_fn(93) }
    }
    fn release_memory_info(&self) -> ReleaseMemoryInfoFn {
        unsafe { self.get_fn(94) }
    }
    fn release_session(&self) -> ReleaseSessionFn {
        unsafe { self.get_fn(95) }
    }
    fn release_value(&self) -> ReleaseValueFn {
        unsafe { self.get_fn(96) }
    }
    fn release_shape_info(&self) -> ReleaseShapeInfoFn {
        unsafe { self.get_fn(99) }
    }
    fn release_session_options(&self) -> ReleaseSessionOptionsFn {
        unsafe { self.get_fn(100) }
    }

    unsafe fn check(&self, status: *mut OrtStatus, what: &str) -> Result<(), String> {
        if status.is_null() {
            return Ok(());
        }
        let msg_ptr = (self.get_error_message())(status);
        let msg = if msg_ptr.is_null() {
            "unknown error".to_string()
        } else {
            std::ffi::CStr::from_ptr(msg_ptr).to_string_lossy().into_owned()
        };
        (self.release_status())(status);
        Err(format!("{}: {}", what, msg))
    }
}

// ============================================================================
// Loaded runtime state
// ============================================================================

struct Loaded {
    // Field order is drop order: sessions and env must outlive nothing, the
    // library handle must be dropped last.
    api: OrtApi,
    env: *mut OrtEnv,
    encoder: *mut OrtSession,
    decoder: *mut OrtSession,
    memory_info: *mut OrtMemoryInfo,
    _lib: libloading::Library,
}

// OrtSession::Run and tensor creation are thread-safe per the ORT API
// contract; the raw pointers are only written during construction.
unsafe impl Send for Loaded {}
unsafe impl Sync for Loaded {}

impl Drop for Loaded {
    fn drop(&mut self) {
        unsafe {
            (self.api.release_session())(self.encoder);
            (self.api.release_session())(self.decoder);
            (self.api.release_memory_info())(self.memory_info);
            (self.api.release_env())(self.env);
        }
    }
}

impl Loaded {
    unsafe fn open(paths: &ModelPaths) -> Result<Loaded, String> {
        let lib = libloading::Library::new(&paths.runtime).map_err(|e| format!("load runtime: {}", e))?;
        let get_api_base: libloading::Symbol<unsafe extern "C" fn() -> *const OrtApiBase> =
            lib.get(b"OrtGetApiBase").map_err(|e| format!("OrtGetApiBase not found: {}", e))?;
        let api_base = get_api_base();
        if api_base.is_null() {
            return Err("OrtGetApiBase returned null".into());
        }
        let raw = ((*api_base).get_api)(ORT_API_VERSION);
        if raw.is_null() {
            return Err(format!("runtime does not provide API version {}", ORT_API_VERSION));
        }
        let api = OrtApi { raw };

        let mut env: *mut OrtEnv = std::ptr::null_mut();
        let logid = CString::new("flatlayer").unwrap();
        api.check((api.create_env())(LOG_WARNING, logid.as_ptr(), &mut env), "CreateEnv")?;

        let mut options: *mut OrtSessionOptions = std::ptr::null_mut();
        api.check((api.create_session_options())(&mut options), "CreateSessionOptions")?;
        api.check((api.set_intra_threads())(options, 2), "SetIntraOpNumThreads")?;
        api.check((api.set_opt_level())(options, OPT_ENABLE_ALL), "SetGraphOptimizationLevel")?;

        // Closures do not inherit the surrounding unsafe context.
        let open_session = |model: &Path| -> Result<*mut OrtSession, String> {
            let wide = to_ort_chars(model);
            let mut session: *mut OrtSession = std::ptr::null_mut();
            unsafe {
                api.check(
                    (api.create_session())(env, wide.as_ptr(), options, &mut session),
                    "CreateSession",
                )?;
            }
            Ok(session)
        };
        let encoder = open_session(&paths.encoder)?;
        let decoder = open_session(&paths.decoder)?;
        (api.release_session_options())(options);

        let mut memory_info: *mut OrtMemoryInfo = std::ptr::null_mut();
        api.check(
            (api.create_cpu_memory_info())(ARENA_ALLOCATOR, MEM_TYPE_DEFAULT, &mut memory_info),
            "CreateCpuMemoryInfo",
        )?;

        Ok(Loaded { api, env, encoder, decoder, memory_info, _lib: lib })
    }

    /// Run one session with f32 tensors and read back f32 outputs with their
    /// shapes. Input buffers stay alive for the duration of the call.
    unsafe fn run_f32(
        &self,
        session: *mut OrtSession,
        inputs: &mut [(&str, Vec<i64>, Vec<f32>)],
        output_names: &[&str],
    ) -> Result<Vec<(Vec<i64>, Vec<f32>)>, String> {
        let api = &self.api;

        let mut tensors: Vec<*mut OrtValue> = Vec::with_capacity(inputs.len());
        let name_cstrings: Vec<CString> =
            inputs.iter().map(|(n, _, _)| CString::new(*n).unwrap()).collect();
        for (_, shape, data) in inputs.iter_mut() {
            let mut tensor: *mut OrtValue = std::ptr::null_mut();
            api.check(
                (api.create_tensor())(
                    self.memory_info,
                    data.as_mut_ptr() as *mut c_void,
                    data.len() * std::mem::size_of::<f32>(),
                    shape.as_ptr(),
                    shape.len(),
                    TENSOR_F32,
                    &mut tensor,
                ),
                "CreateTensor",
            )?;
            tensors.push(tensor);
        }

        let input_name_ptrs: Vec<*const c_char> = name_cstrings.iter().map(|c| c.as_ptr()).collect();
        let out_cstrings: Vec<CString> =
            output_names.iter().map(|n| CString::new(*n).unwrap()).collect();
        let output_name_ptrs: Vec<*const c_char> = out_cstrings.iter().map(|c| c.as_ptr()).collect();
        let mut outputs: Vec<*mut OrtValue> = vec![std::ptr::null_mut(); output_names.len()];

        let status = (api.run())(
            session,
            std::ptr::null(),
            input_name_ptrs.as_ptr(),
            tensors.as_ptr() as *const *const OrtValue,
            tensors.len(),
            output_name_ptrs.as_ptr(),
            output_names.len(),
            outputs.as_mut_ptr(),
        );
        for t in &tensors {
            (api.release_value())(*t);
        }
        api.check(status, "Run")?;

        let mut results = Vec::with_capacity(outputs.len());
        for &out in &outputs {
            let mut shape_info: *mut OrtTensorTypeAndShapeInfo = std::ptr::null_mut();
            api.check((api.get_shape_info())(out, &mut shape_info), "GetTensorTypeAndShape")?;
            let mut dim_count = 0usize;
            api.check((api.get_dim_count())(shape_info, &mut dim_count), "GetDimensionsCount")?;
            let mut dims = vec![0i64; dim_count];
            api.check((api.get_dims())(shape_info, dims.as_mut_ptr(), dim_count), "GetDimensions")?;
            (api.release_shape_info())(shape_info);

            let len: i64 = dims.iter().product();
            let mut data_ptr: *mut c_void = std::ptr::null_mut();
            api.check((api.get_tensor_data())(out, &mut data_ptr), "GetTensorMutableData")?;
            let slice = std::slice::from_raw_parts(data_ptr as *const f32, len.max(0) as usize);
            results.push((dims, slice.to_vec()));
            (api.release_value())(out);
        }
        Ok(results)
    }
}

// ============================================================================
// Pre/post-processing
// ============================================================================

/// Aspect-preserving resize to the model's input square, zero-padded at the
/// right/bottom. Returns the CHW tensor plus the applied scale.
fn preprocess(image: &RgbImage) -> (Vec<f32>, f32) {
    let (w, h) = image.dimensions();
    let scale = MODEL_INPUT_SIZE as f32 / w.max(h) as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);
    let resized =
        image::imageops::resize(image, new_w, new_h, image::imageops::FilterType::Lanczos3);

    let side = MODEL_INPUT_SIZE as usize;
    let plane = side * side;
    let mut tensor = vec![0.0f32; 3 * plane];
    for (x, y, px) in resized.enumerate_pixels() {
        let idx = y as usize * side + x as usize;
        for c in 0..3 {
            tensor[c * plane + idx] = (px.0[c] as f32 - PIXEL_MEAN[c]) / PIXEL_STD[c];
        }
    }
    (tensor, scale)
}

/// Binary mask from one logit plane, thresholded at zero, resized to the
/// original image dimensions when the decoder worked at another resolution.
fn mask_from_logits(logits: &[f32], mh: u32, mw: u32, target: (u32, u32)) -> GrayImage {
    let data: Vec<u8> = logits.iter().map(|&v| if v > 0.0 { FG } else { 0 }).collect();
    let raw = GrayImage::from_raw(mw, mh, data).unwrap();
    if (mw, mh) == target {
        return raw;
    }
    let resized =
        image::imageops::resize(&raw, target.0, target.1, image::imageops::FilterType::Triangle);
    // Resampling reintroduces gray; re-quantize at the boundary.
    crate::mask::binarize(&resized)
}

// ============================================================================
// Service object
// ============================================================================

/// Lazily-initialized promptable model. Construction is cheap and never
/// touches the filesystem; the runtime and both sessions load on first use,
/// at most once per process.
pub struct OnnxPromptModel {
    paths: ModelPaths,
    state: OnceLock<Result<Loaded, String>>,
}

impl OnnxPromptModel {
    pub fn new(paths: ModelPaths) -> OnnxPromptModel {
        OnnxPromptModel { paths, state: OnceLock::new() }
    }

    fn loaded(&self) -> Result<&Loaded, EngineError> {
        let state = self.state.get_or_init(|| {
            validate_model_path(&self.paths.runtime, true)?;
            validate_model_path(&self.paths.encoder, false)?;
            validate_model_path(&self.paths.decoder, false)?;
            info!("onnx: loading runtime from {}", self.paths.runtime.display());
            unsafe { Loaded::open(&self.paths) }
        });
        state.as_ref().map_err(|e| EngineError::ModelUnavailable(e.clone()))
    }
}

impl PromptSegmenter for OnnxPromptModel {
    fn is_available(&self) -> bool {
        if let Some(state) = self.state.get() {
            return state.is_ok();
        }
        [(&self.paths.runtime, true), (&self.paths.encoder, false), (&self.paths.decoder, false)]
            .iter()
            .all(|(p, lib)| validate_model_path(p, *lib).is_ok() && p.is_file())
    }

    fn embed(&self, image: &RgbImage) -> Result<Embedding, EngineError> {
        let loaded = self.loaded()?;
        let (tensor, _) = preprocess(image);
        let side = MODEL_INPUT_SIZE as i64;

        let mut inputs: Vec<(&str, Vec<i64>, Vec<f32>)> =
            vec![("x", vec![1, 3, side, side], tensor)];
        let outputs = unsafe { loaded.run_f32(loaded.encoder, &mut inputs, &["image_embeddings"]) }
            .map_err(EngineError::ModelUnavailable)?;

        let (shape, data) = outputs.into_iter().next().ok_or_else(|| {
            EngineError::ModelUnavailable("encoder produced no output".into())
        })?;
        Ok(Embedding { data, shape, original_size: image.dimensions() })
    }

    fn predict_point(
        &self,
        embedding: &Embedding,
        x: u32,
        y: u32,
    ) -> Result<Vec<MaskCandidate>, EngineError> {
        let loaded = self.loaded()?;
        let (w, h) = embedding.original_size;
        let scale = MODEL_INPUT_SIZE as f32 / w.max(h) as f32;

        // One foreground click plus the padding point the export requires.
        let coords = vec![x as f32 * scale, y as f32 * scale, 0.0, 0.0];
        let labels = vec![1.0f32, -1.0];

        let mut inputs: Vec<(&str, Vec<i64>, Vec<f32>)> = vec![
            (IN_EMBEDDINGS, embedding.shape.clone(), embedding.data.clone()),
            (IN_POINT_COORDS, vec![1, 2, 2], coords),
            (IN_POINT_LABELS, vec![1, 2], labels),
            (IN_MASK_INPUT, vec![1, 1, 256, 256], vec![0.0f32; 256 * 256]),
            (IN_HAS_MASK, vec![1], vec![0.0f32]),
            (IN_ORIG_SIZE, vec![2], vec![h as f32, w as f32]),
        ];
        let outputs = unsafe {
            loaded.run_f32(loaded.decoder, &mut inputs, &[OUT_MASKS, OUT_SCORES])
        }
        .map_err(EngineError::ModelUnavailable)?;

        let mut iter = outputs.into_iter();
        let (mask_shape, mask_data) = iter
            .next()
            .ok_or_else(|| EngineError::ModelUnavailable("decoder produced no masks".into()))?;
        let (_, scores) = iter
            .next()
            .ok_or_else(|| EngineError::ModelUnavailable("decoder produced no scores".into()))?;

        if mask_shape.len() != 4 {
            return Err(EngineError::ModelUnavailable(format!(
                "unexpected mask tensor shape {:?}",
                mask_shape
            )));
        }
        let n = mask_shape[1] as usize;
        let mh = mask_shape[2] as u32;
        let mw = mask_shape[3] as u32;
        let plane = (mh * mw) as usize;

        let mut candidates: Vec<MaskCandidate> = (0..n)
            .map(|i| {
                let logits = &mask_data[i * plane..(i + 1) * plane];
                let mask = mask_from_logits(logits, mh, mw, (w, h));
                let area = crate::mask::area(&mask);
                MaskCandidate { mask, score: scores.get(i).copied().unwrap_or(0.0), area }
            })
            .collect();
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(candidates)
    }
}
