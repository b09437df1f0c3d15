//! AppleScript compile/execute with `Result`s
//!
//! The native engine reports failure as a success flag plus an optional error
//! dictionary. [`Script`] turns that into [`Error::Script`](crate::Error),
//! whose status is the dictionary's error number, or `errOSAScriptError`
//! when the engine gave none.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{OsStatus, Result};
use crate::geometry::Range;

pub const ERROR_MESSAGE_KEY: &str = "NSAppleScriptErrorMessage";
pub const ERROR_BRIEF_MESSAGE_KEY: &str = "NSAppleScriptErrorBriefMessage";
pub const ERROR_NUMBER_KEY: &str = "NSAppleScriptErrorNumber";
pub const ERROR_APP_NAME_KEY: &str = "NSAppleScriptErrorAppName";
pub const ERROR_RANGE_KEY: &str = "NSAppleScriptErrorRange";

/// Contents of the engine's error dictionary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScriptErrorInfo {
    #[serde(rename = "NSAppleScriptErrorMessage", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "NSAppleScriptErrorBriefMessage", default, skip_serializing_if = "Option::is_none")]
    pub brief_message: Option<String>,
    #[serde(rename = "NSAppleScriptErrorNumber", default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    #[serde(rename = "NSAppleScriptErrorAppName", default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(rename = "NSAppleScriptErrorRange", default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl ScriptErrorInfo {
    /// Read the dictionary from its JSON form. Unrecognised shapes give an
    /// empty info.
    pub fn from_json(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// A failed compile or execute
#[derive(Error, Debug, Clone, PartialEq)]
#[error("AppleScript error {}: {}", .status, .description.as_deref().unwrap_or("unknown error"))]
pub struct ScriptError {
    pub status: OsStatus,
    /// Full message (`NSAppleScriptErrorMessage`)
    pub failure_reason: Option<String>,
    /// Short message (`NSAppleScriptErrorBriefMessage`)
    pub description: Option<String>,
    pub info: Option<ScriptErrorInfo>,
}

impl ScriptError {
    pub fn from_info(info: Option<ScriptErrorInfo>) -> Self {
        match info {
            Some(info) => Self {
                status: info.number.map(OsStatus).unwrap_or(OsStatus::OSA_SCRIPT_ERROR),
                failure_reason: info.message.clone(),
                description: info.brief_message.clone(),
                info: Some(info),
            },
            None => Self {
                status: OsStatus::OSA_SCRIPT_ERROR,
                failure_reason: None,
                description: None,
                info: None,
            },
        }
    }
}

/// Outcome of a native engine call: `Err` holds the error dictionary, if any
pub type EngineResult<T> = std::result::Result<T, Option<ScriptErrorInfo>>;

/// Native scripting engine holding one script
pub trait ScriptEngine {
    /// Apple event descriptor type of the engine
    type Descriptor;

    /// Compile the source, if not already compiled
    fn compile(&mut self) -> EngineResult<()>;

    /// Run the script, compiling first if needed
    fn execute(&mut self) -> EngineResult<Self::Descriptor>;

    /// Send an Apple event to the script, compiling first if needed
    fn execute_apple_event(&mut self, event: &Self::Descriptor) -> EngineResult<Self::Descriptor>;

    fn is_compiled(&self) -> bool;
}

/// A script with `Result`-returning operations
pub struct Script<E: ScriptEngine> {
    engine: E,
}

impl<E: ScriptEngine> Script<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn is_compiled(&self) -> bool {
        self.engine.is_compiled()
    }

    /// Compile the script, if it is not already compiled
    pub fn compile(&mut self) -> Result<()> {
        self.engine.compile().map_err(Self::failure)
    }

    /// Execute the script and return its result
    pub fn execute(&mut self) -> Result<E::Descriptor> {
        self.engine.execute().map_err(Self::failure)
    }

    /// Execute an Apple event in the context of the script
    pub fn execute_apple_event(&mut self, event: &E::Descriptor) -> Result<E::Descriptor> {
        self.engine.execute_apple_event(event).map_err(Self::failure)
    }

    fn failure(info: Option<ScriptErrorInfo>) -> crate::Error {
        let error = ScriptError::from_info(info);
        debug!("[AppleScript] {}", error);
        error.into()
    }
}

#[cfg(target_os = "macos")]
mod native {
    use std::path::Path;

    use objc2::rc::Retained;
    use objc2::runtime::{AnyClass, AnyObject, NSObject, NSObjectProtocol};
    use objc2::{msg_send_id, ClassType};
    use objc2_foundation::{
        NSAppleEventDescriptor, NSAppleScript, NSDictionary, NSNumber, NSString, NSValue, NSURL,
    };
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::error::Error;

    type ErrorDict = Option<Retained<NSDictionary<NSString, AnyObject>>>;

    fn is_kind_of(object: &AnyObject, class: &AnyClass) -> bool {
        // SAFETY: dictionary values are NSObject instances
        unsafe { (*(object as *const AnyObject).cast::<NSObject>()).isKindOfClass(class) }
    }

    /// Copy the known keys of a native error dictionary into JSON
    fn error_info(dict: ErrorDict) -> Option<ScriptErrorInfo> {
        let dict = dict?;
        let mut map = Map::new();

        for key in [
            ERROR_MESSAGE_KEY,
            ERROR_BRIEF_MESSAGE_KEY,
            ERROR_NUMBER_KEY,
            ERROR_APP_NAME_KEY,
            ERROR_RANGE_KEY,
        ] {
            let Some(object) = dict.get(&NSString::from_str(key)) else {
                continue;
            };
            // SAFETY: class checked before each cast. NSNumber is an NSValue,
            // so it is tested first.
            unsafe {
                if is_kind_of(object, NSString::class()) {
                    let string = &*(object as *const AnyObject).cast::<NSString>();
                    map.insert(key.to_string(), Value::from(string.to_string()));
                } else if is_kind_of(object, NSNumber::class()) {
                    let number = &*(object as *const AnyObject).cast::<NSNumber>();
                    map.insert(key.to_string(), Value::from(number.as_i32()));
                } else if is_kind_of(object, NSValue::class()) {
                    let value = &*(object as *const AnyObject).cast::<NSValue>();
                    let range = value.rangeValue();
                    map.insert(
                        key.to_string(),
                        json!({ "location": range.location, "length": range.length }),
                    );
                }
            }
        }

        Some(ScriptErrorInfo::from_json(Value::Object(map)))
    }

    /// Success is a non-nil descriptor; the dictionary only explains a failure
    fn descriptor_or_error(
        descriptor: Option<Retained<NSAppleEventDescriptor>>,
        dict: ErrorDict,
    ) -> EngineResult<Retained<NSAppleEventDescriptor>> {
        descriptor.ok_or_else(|| error_info(dict))
    }

    /// `NSAppleScript`-backed engine
    pub struct NativeAppleScript {
        script: Retained<NSAppleScript>,
    }

    impl NativeAppleScript {
        /// Script from source text
        pub fn new(source: &str) -> Result<Self> {
            let source = NSString::from_str(source);
            let script = unsafe { NSAppleScript::initWithSource(NSAppleScript::alloc(), &source) };
            script
                .map(|script| Self { script })
                .ok_or(Error::Script(ScriptError::from_info(None)))
        }

        /// Script from a source or compiled script file
        pub fn from_path(path: &Path) -> Result<Self> {
            let path_string = path
                .to_str()
                .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
            let url = unsafe { NSURL::fileURLWithPath(&NSString::from_str(path_string)) };

            let mut dict: ErrorDict = None;
            let script = unsafe {
                NSAppleScript::initWithContentsOfURL_error(NSAppleScript::alloc(), &url, Some(&mut dict))
            };
            script
                .map(|script| Self { script })
                .ok_or_else(|| Error::Script(ScriptError::from_info(error_info(dict))))
        }

        pub fn source(&self) -> Option<String> {
            unsafe { self.script.source() }.map(|s| s.to_string())
        }
    }

    impl ScriptEngine for NativeAppleScript {
        type Descriptor = Retained<NSAppleEventDescriptor>;

        fn compile(&mut self) -> EngineResult<()> {
            let mut dict: ErrorDict = None;
            if unsafe { self.script.compileAndReturnError(Some(&mut dict)) } {
                Ok(())
            } else {
                Err(error_info(dict))
            }
        }

        // The generated bindings declare these results non-null, but a
        // runtime failure returns nil.
        fn execute(&mut self) -> EngineResult<Self::Descriptor> {
            let mut dict: ErrorDict = None;
            let descriptor: Option<Retained<NSAppleEventDescriptor>> = unsafe {
                msg_send_id![&*self.script, executeAndReturnError: Some(&mut dict)]
            };
            descriptor_or_error(descriptor, dict)
        }

        fn execute_apple_event(&mut self, event: &Self::Descriptor) -> EngineResult<Self::Descriptor> {
            let mut dict: ErrorDict = None;
            let descriptor: Option<Retained<NSAppleEventDescriptor>> = unsafe {
                msg_send_id![&*self.script, executeAppleEvent: &**event, error: Some(&mut dict)]
            };
            descriptor_or_error(descriptor, dict)
        }

        fn is_compiled(&self) -> bool {
            unsafe { self.script.isCompiled() }
        }
    }

    /// String value of a result descriptor, if it has one
    pub fn descriptor_string(descriptor: &NSAppleEventDescriptor) -> Option<String> {
        unsafe { descriptor.stringValue() }.map(|s| s.to_string())
    }

}

#[cfg(target_os = "macos")]
pub use native::{descriptor_string, NativeAppleScript};
