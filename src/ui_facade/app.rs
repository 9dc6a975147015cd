/*
 * The application object: owns the native backend and the loaded configuration,
 * hands out class names and creation defaults derived from that configuration,
 * and runs the top-level message loop.
 */

use crate::environment::config::{ConfigManagerOperations, FacadeConfig};
use crate::environment::logging;
use crate::platform_layer::error::Result as FacadeResult;
use crate::platform_layer::native::NativeWindowOperations;
use crate::platform_layer::reporting::{
    UnhandledError, clear_unhandled_error_reporter, set_unhandled_error_reporter,
};
use crate::platform_layer::types::{CreateParams, DialogTemplate, Point, Rect, WindowClass};
use crate::ui_facade::dialog::{Dialog, centered_rect};

use std::rc::Rc;

const UNHANDLED_ERROR_TITLE: &str = "Unhandled Error";

pub struct Application {
    native: Rc<dyn NativeWindowOperations>,
    config: FacadeConfig,
}

impl Application {
    pub fn new(native: Rc<dyn NativeWindowOperations>, config: FacadeConfig) -> Self {
        Self { native, config }
    }

    /*
     * Loads the configuration for `app_name` and installs logging from it. A
     * logger that is already installed is kept.
     */
    pub fn from_config_manager(
        native: Rc<dyn NativeWindowOperations>,
        manager: &dyn ConfigManagerOperations,
        app_name: &str,
    ) -> FacadeResult<Self> {
        let config = manager.load_config(app_name)?;
        if !logging::init(&config.logging)? {
            log::debug!("Application: Logger already installed; keeping it.");
        }
        log::debug!("Application: '{app_name}' starting with {config:?}");
        Ok(Self::new(native, config))
    }

    #[cfg(target_os = "windows")]
    pub fn win32(config: FacadeConfig) -> FacadeResult<Self> {
        let native = crate::platform_layer::win32::Win32Native::new()?;
        Ok(Self::new(Rc::new(native), config))
    }

    pub fn native(&self) -> &Rc<dyn NativeWindowOperations> {
        &self.native
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }

    /// `base` qualified with the configured class name prefix.
    pub fn class_name(&self, base: &str) -> String {
        if self.config.class_name_prefix.is_empty() {
            base.to_string()
        } else {
            format!("{}_{base}", self.config.class_name_prefix)
        }
    }

    pub fn window_class(&self, base: &str) -> WindowClass {
        WindowClass::new(self.class_name(base))
    }

    // A top-level window of the configured default size, centred in the work area.
    pub fn default_create_params(&self, title: &str) -> CreateParams {
        let work_area = self.native.work_area();
        let rect = Rect::from_origin_size(Point::default(), self.config.default_window_size);
        CreateParams {
            title: title.to_string(),
            rect: Some(centered_rect(rect, work_area, work_area)),
            ..CreateParams::default()
        }
    }

    pub fn dialog(&self, template: DialogTemplate) -> Dialog {
        Dialog::new(Rc::clone(&self.native), template).centered(self.config.center_modal_dialogs)
    }

    /*
     * With `report_unhandled_to_user` set, contained handler failures are also
     * shown in a message box owned by the failing window, if it is still alive.
     * Otherwise they only reach the log.
     */
    pub fn install_error_reporter(&self) {
        if !self.config.report_unhandled_to_user {
            clear_unhandled_error_reporter();
            return;
        }
        let native = Rc::clone(&self.native);
        set_unhandled_error_reporter(move |error: &UnhandledError| {
            let owner = Some(error.handle).filter(|handle| native.is_window(*handle));
            let text = format!(
                "A handler failed while processing message {:#06x}:\n\n{}",
                error.message.id, error.description
            );
            native.show_error_message(owner, UNHANDLED_ERROR_TITLE, &text);
        });
    }

    /// Runs the message loop until quit; returns the exit code.
    pub fn run(&self) -> i32 {
        log::debug!("Application: Entering message loop.");
        let exit_code = self.native.run_message_loop();
        log::debug!("Application: Message loop ended with exit code {exit_code}.");
        exit_code
    }

    pub fn quit(&self, exit_code: i32) {
        self.native.post_quit(exit_code);
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::config::{ConfigError, Result as ConfigResult};
    use crate::platform_layer::error::FacadeError;
    use crate::platform_layer::headless::HeadlessNative;
    use crate::platform_layer::reporting::report_unhandled;
    use crate::platform_layer::types::{Handle, Message, Size};
    use std::cell::RefCell;

    struct MockConfigManager {
        config: Option<FacadeConfig>,
        loads: RefCell<Vec<String>>,
    }

    impl ConfigManagerOperations for MockConfigManager {
        fn load_config(&self, app_name: &str) -> ConfigResult<FacadeConfig> {
            self.loads.borrow_mut().push(app_name.to_string());
            self.config.clone().ok_or(ConfigError::NoConfigDirectory)
        }

        fn save_config(&self, _app_name: &str, _config: &FacadeConfig) -> ConfigResult<()> {
            Ok(())
        }
    }

    fn headless_app(config: FacadeConfig) -> (Rc<HeadlessNative>, Application) {
        let native = Rc::new(HeadlessNative::new());
        let app = Application::new(native.clone(), config);
        (native, app)
    }

    #[test]
    fn test_class_name_applies_prefix() {
        let (_native, app) = headless_app(FacadeConfig::default());
        assert_eq!(app.class_name("Main"), "WinFacade_Main");

        let (_native, bare) = headless_app(FacadeConfig {
            class_name_prefix: String::new(),
            ..FacadeConfig::default()
        });
        assert_eq!(bare.class_name("Main"), "Main");
    }

    #[test]
    fn test_default_create_params_centre_configured_size() {
        // Arrange
        let (native, app) = headless_app(FacadeConfig {
            default_window_size: Size::new(400, 200),
            ..FacadeConfig::default()
        });
        native.set_work_area(Rect::new(0, 0, 1000, 800));

        // Act
        let params = app.default_create_params("Main");

        // Assert
        assert_eq!(params.title, "Main");
        assert_eq!(params.rect, Some(Rect::new(300, 300, 700, 500)));
    }

    #[test]
    fn test_from_config_manager_loads_named_config() {
        // Arrange
        let manager = MockConfigManager {
            config: Some(FacadeConfig {
                center_modal_dialogs: false,
                ..FacadeConfig::default()
            }),
            loads: RefCell::new(Vec::new()),
        };

        // Act
        let app = Application::from_config_manager(
            Rc::new(HeadlessNative::new()),
            &manager,
            "Sample",
        )
        .expect("application should start");

        // Assert
        assert_eq!(*manager.loads.borrow(), vec!["Sample".to_string()]);
        assert!(!app.config().center_modal_dialogs);
    }

    #[test]
    fn test_from_config_manager_surfaces_config_errors() {
        let manager = MockConfigManager {
            config: None,
            loads: RefCell::new(Vec::new()),
        };
        let result =
            Application::from_config_manager(Rc::new(HeadlessNative::new()), &manager, "Sample");
        assert!(matches!(result, Err(FacadeError::Config(_))));
    }

    #[test]
    fn test_error_reporter_shows_message_box_when_enabled() {
        // Arrange
        let (native, app) = headless_app(FacadeConfig::default());
        app.install_error_reporter();
        let dead = Handle::from_raw(0x4242).expect("non-zero");

        // Act
        report_unhandled(&UnhandledError {
            handle: dead,
            message: Message::new(0x0111, 0, 0),
            description: "boom".to_string(),
        });
        clear_unhandled_error_reporter();

        // Assert
        let shown = native.error_messages();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].contains("boom"));
    }

    #[test]
    fn test_error_reporter_is_silent_when_disabled() {
        // Arrange
        let (native, app) = headless_app(FacadeConfig {
            report_unhandled_to_user: false,
            ..FacadeConfig::default()
        });
        app.install_error_reporter();

        // Act
        report_unhandled(&UnhandledError {
            handle: Handle::from_raw(0x4242).expect("non-zero"),
            message: Message::new(0x000F, 0, 0),
            description: "quiet".to_string(),
        });

        // Assert
        assert!(native.error_messages().is_empty());
    }

    #[test]
    fn test_quit_ends_run_with_exit_code() {
        let (_native, app) = headless_app(FacadeConfig::default());
        app.quit(7);
        assert_eq!(app.run(), 7);
    }
}
