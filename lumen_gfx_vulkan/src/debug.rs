/// Vulkan Debug Messenger - routes validation layer messages into the engine logger
///
/// Only compiled with the `vulkan-validation` feature. Messages are counted per
/// severity and identical messages are grouped so repeats show a `[xN]` marker.

use ash::vk;
use colored::*;
use lumen_gfx::lumen::log::{self, LogSeverity};
use lumen_gfx::lumen::{DebugSeverity, Error, Result};
use lumen_gfx::engine_error;
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

const SOURCE: &str = "lumen::vulkan::validation";

/// Global validation statistics (thread-safe atomic counters)
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Global message tracker for grouping identical messages
static MESSAGE_TRACKER: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Validation message counts since the device was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn record(&self, severity: LogSeverity) {
        let counter = match severity {
            LogSeverity::Error => &self.errors,
            LogSeverity::Warn => &self.warnings,
            LogSeverity::Info => &self.info,
            _ => &self.verbose,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Count an occurrence of `message`, returning how many times it has been seen
fn track_message(message: &str) -> u32 {
    let Ok(mut guard) = MESSAGE_TRACKER.lock() else {
        return 1;
    };
    let tracker = guard.get_or_insert_with(FxHashMap::default);
    let count = tracker.entry(message.to_string()).or_insert(0);
    *count += 1;
    *count
}

fn reset_tracking() {
    VALIDATION_STATS.reset();
    if let Ok(mut guard) = MESSAGE_TRACKER.lock() {
        *guard = Some(FxHashMap::default());
    }
}

/// Get current validation statistics
pub fn validation_stats() -> ValidationStats {
    VALIDATION_STATS.get()
}

/// Print validation statistics report
pub fn print_validation_stats_report() {
    let stats = validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());

    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }

    println!("  {} {}", "Total:".white().bold(), stats.total());

    if let Ok(guard) = MESSAGE_TRACKER.lock() {
        if let Some(tracker) = guard.as_ref() {
            let duplicates = tracker.values().filter(|&&count| count > 1).count();
            if duplicates > 0 {
                println!("\n  {} message(s) appeared multiple times", duplicates);
            }
        }
    }

    println!("{}\n", "====================================".bright_blue().bold());
}

/// Messenger severity mask for the configured verbosity
pub(crate) fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

/// Engine log severity of a validation message
pub(crate) fn log_severity(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Info
    } else {
        LogSeverity::Trace
    }
}

fn message_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Vulkan debug messenger callback
///
/// # Safety
///
/// Called by the validation layers with a valid callback data pointer.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown".into()
    } else {
        CStr::from_ptr(callback_data.p_message_id_name).to_string_lossy()
    };
    let message = if callback_data.p_message.is_null() {
        "No message".into()
    } else {
        CStr::from_ptr(callback_data.p_message).to_string_lossy()
    };

    let severity = log_severity(message_severity);
    VALIDATION_STATS.record(severity);

    let occurrences = track_message(&message);
    let repeat = if occurrences > 1 {
        format!(" [x{}]", occurrences)
    } else {
        String::new()
    };

    log::emit(
        severity,
        SOURCE,
        format!("[{}] {}{}: {}", message_type_name(message_type), message_id_name, repeat, message),
    );

    vk::FALSE // Don't abort Vulkan execution
}

/// Debug utils loader and the messenger created through it
pub(crate) struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    pub(crate) fn new(
        entry: &ash::Entry,
        instance: &ash::Instance,
        severity: DebugSeverity,
    ) -> Result<Self> {
        reset_tracking();

        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(severity_flags(severity))
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback));

        let messenger = unsafe {
            loader
                .create_debug_utils_messenger(&debug_info, None)
                .map_err(|e| {
                    engine_error!("lumen::vulkan", "Failed to create debug messenger: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
                })?
        };

        Ok(Self { loader, messenger })
    }

    /// # Safety
    ///
    /// Must be called once, before the instance is destroyed.
    pub(crate) unsafe fn destroy(&mut self) {
        self.loader.destroy_debug_utils_messenger(self.messenger, None);
        self.messenger = vk::DebugUtilsMessengerEXT::null();
    }
}
