// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS notification center via objc2 / UserNotifications.framework.
//
// Requires compilation with the iOS SDK (Xcode). This module is cfg-gated to
// `target_os = "ios"` and will not compile on other platforms.
//
// Threading: UNUserNotificationCenter completion handlers run on a private
// queue. They only post `ShellEvent`s. `registerForRemoteNotifications` and
// the delegate callbacks need the main thread, which is also where the shell
// event loop runs.
//
// Remote registration results are delivered by UIKit to the application
// delegate. The window library owns that delegate, so the two
// `application:didRegisterForRemoteNotificationsWithDeviceToken:` /
// `application:didFailToRegisterForRemoteNotificationsWithError:` methods are
// added to its class at runtime the first time registration is requested.

#![cfg(target_os = "ios")]

use std::cell::{Cell, RefCell};
use std::ffi::CStr;
use std::sync::{Arc, Once, OnceLock};

use block2::{DynBlock, RcBlock};
use objc2::rc::Retained;
use objc2::runtime::{AnyClass, AnyObject, Bool, NSObject, NSObjectProtocol, ProtocolObject, Sel};
use objc2::{MainThreadMarker, define_class, msg_send, sel};
use objc2_foundation::{NSData, NSDictionary, NSError, NSNumber, NSString};
use objc2_ui_kit::UIApplication;
use objc2_user_notifications::{
    UNAuthorizationOptions, UNMutableNotificationContent, UNNotification,
    UNNotificationPresentationOptions, UNNotificationRequest, UNNotificationResponse,
    UNNotificationSound, UNUserNotificationCenter, UNUserNotificationCenterDelegate,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use chatshell_core::error::{Result, ShellError};
use chatshell_core::types::{
    DeviceToken, META_CONVERSATION_ID, META_SENDER_ID, META_TIMESTAMP, NotificationOptions,
    NotificationRequest, UserInfoValue,
};

use crate::notifier::foreground_presentation;
use crate::traits::{AuthorizationCallback, Completion, EventSink, NotificationCenter, ShellEvent};

/// Sink used by the app-delegate hooks, which have no `self` to carry it.
static REGISTRATION_SINK: OnceLock<Arc<dyn EventSink>> = OnceLock::new();

thread_local! {
    /// `UNUserNotificationCenter.delegate` is weak; the main thread keeps the
    /// delegate alive for the life of the process.
    static DELEGATE: RefCell<Option<Retained<NotificationDelegate>>> = const { RefCell::new(None) };
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_main_thread() -> Result<MainThreadMarker> {
    MainThreadMarker::new()
        .ok_or_else(|| ShellError::Bridge("must be called from the main thread".into()))
}

fn current_center() -> Retained<UNUserNotificationCenter> {
    // SAFETY: class method with no preconditions; the center is thread-safe.
    unsafe { UNUserNotificationCenter::currentNotificationCenter() }
}

fn authorization_options(options: NotificationOptions) -> UNAuthorizationOptions {
    let mut out = UNAuthorizationOptions::empty();
    if options.alert {
        out |= UNAuthorizationOptions::Alert;
    }
    if options.badge {
        out |= UNAuthorizationOptions::Badge;
    }
    if options.sound {
        out |= UNAuthorizationOptions::Sound;
    }
    out
}

fn presentation_options(options: NotificationOptions) -> UNNotificationPresentationOptions {
    let mut out = UNNotificationPresentationOptions::empty();
    if options.alert {
        out |= UNNotificationPresentationOptions::Banner | UNNotificationPresentationOptions::List;
    }
    if options.badge {
        out |= UNNotificationPresentationOptions::Badge;
    }
    if options.sound {
        out |= UNNotificationPresentationOptions::Sound;
    }
    out
}

/// Box a metadata value as the Foundation object stored in `userInfo`.
fn user_info_object(value: UserInfoValue) -> Retained<NSObject> {
    match value {
        UserInfoValue::Text(s) => Retained::into_super(NSString::from_str(&s)),
        UserInfoValue::Integer(n) => Retained::into_super(Retained::into_super(NSNumber::new_i64(n))),
    }
}

/// Read the metadata keys back out of a delivered notification's `userInfo`.
fn user_info_map(info: &NSDictionary<AnyObject, AnyObject>) -> Map<String, Value> {
    let mut map = Map::new();
    for key in [META_CONVERSATION_ID, META_SENDER_ID, META_TIMESTAMP] {
        let ns_key = NSString::from_str(key);
        // SAFETY: objectForKey: on an NSDictionary with an NSString key.
        let object: Option<Retained<AnyObject>> = unsafe { msg_send![info, objectForKey: &*ns_key] };
        let Some(object) = object else { continue };
        let value = if let Some(s) = object.downcast_ref::<NSString>() {
            UserInfoValue::Text(s.to_string())
        } else if let Some(n) = object.downcast_ref::<NSNumber>() {
            UserInfoValue::Integer(n.as_i64())
        } else {
            continue;
        };
        map.insert(key.into(), value.into_json());
    }
    map
}

// ---------------------------------------------------------------------------
// UNUserNotificationCenterDelegate
// ---------------------------------------------------------------------------

struct DelegateIvars {
    sink: Arc<dyn EventSink>,
}

/// Carries a tap completion handler to the UI thread.
struct TapCompletion(RcBlock<dyn Fn()>);

// SAFETY: the block is only invoked from the shell event loop, which runs on
// the main thread where UIKit delivered it.
unsafe impl Send for TapCompletion {}

impl TapCompletion {
    fn call(&self) {
        self.0.call(());
    }
}

// SAFETY: define_class! #[unsafe(super(NSObject))] declares an ObjC class
// inheriting from NSObject. MainThreadOnly matches UNUserNotificationCenter's
// delivery of delegate callbacks on the main thread.
define_class! {
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "ChatShellNotificationDelegate"]
    #[ivars = DelegateIvars]
    struct NotificationDelegate;

    unsafe impl NSObjectProtocol for NotificationDelegate {}

    unsafe impl UNUserNotificationCenterDelegate for NotificationDelegate {
        /// A notification arrived while the app is active: always show it.
        #[unsafe(method(userNotificationCenter:willPresentNotification:withCompletionHandler:))]
        fn will_present(
            &self,
            _center: &UNUserNotificationCenter,
            _notification: &UNNotification,
            completion_handler: &DynBlock<dyn Fn(UNNotificationPresentationOptions)>,
        ) {
            completion_handler.call((presentation_options(foreground_presentation()),));
        }

        /// The user tapped a notification.
        #[unsafe(method(userNotificationCenter:didReceiveNotificationResponse:withCompletionHandler:))]
        fn did_receive(
            &self,
            _center: &UNUserNotificationCenter,
            response: &UNNotificationResponse,
            completion_handler: &DynBlock<dyn Fn()>,
        ) {
            // SAFETY: response.notification.request.content.userInfo are plain
            // property reads on objects UIKit handed us.
            let info: Retained<NSDictionary<AnyObject, AnyObject>> = unsafe {
                let notification: Retained<UNNotification> = msg_send![response, notification];
                let request: Retained<UNNotificationRequest> = msg_send![&notification, request];
                let content: Retained<AnyObject> = msg_send![&request, content];
                msg_send![&content, userInfo]
            };
            let handler = TapCompletion(completion_handler.copy());
            self.ivars().sink.post(ShellEvent::NotificationTapped {
                user_info: user_info_map(&info),
                completion: Completion::new(move || handler.call()),
            });
        }
    }
}

impl NotificationDelegate {
    fn new(mtm: MainThreadMarker, sink: Arc<dyn EventSink>) -> Retained<Self> {
        let this = mtm.alloc::<Self>();
        let this = this.set_ivars(DelegateIvars { sink });
        // SAFETY: standard NSObject init via super.
        unsafe { msg_send![super(this), init] }
    }
}

// ---------------------------------------------------------------------------
// Application delegate hooks (remote registration)
// ---------------------------------------------------------------------------

unsafe extern "C-unwind" fn did_register_with_token(
    _this: &AnyObject,
    _cmd: Sel,
    _application: &AnyObject,
    token: &NSData,
) {
    let token = DeviceToken(token.to_vec());
    if let Some(sink) = REGISTRATION_SINK.get() {
        sink.post(ShellEvent::DeviceTokenRegistered(token));
    }
}

unsafe extern "C-unwind" fn did_fail_to_register(
    _this: &AnyObject,
    _cmd: Sel,
    _application: &AnyObject,
    error: &NSError,
) {
    let message = error.localizedDescription().to_string();
    if let Some(sink) = REGISTRATION_SINK.get() {
        sink.post(ShellEvent::DeviceTokenFailed(message));
    }
}

/// Add the remote-registration callbacks to the application delegate's class.
fn install_app_delegate_hooks(mtm: MainThreadMarker) -> Result<()> {
    let app = UIApplication::sharedApplication(mtm);
    // SAFETY: UIApplication.delegate is a plain property read on the main thread.
    let delegate: Option<Retained<AnyObject>> = unsafe { msg_send![&app, delegate] };
    let delegate =
        delegate.ok_or_else(|| ShellError::Bridge("application has no delegate".into()))?;
    let class: &AnyClass = delegate.class();

    const TYPES: &CStr = c"v@:@@";
    let hooks: [(Sel, objc2::runtime::Imp); 2] = [
        (
            sel!(application:didRegisterForRemoteNotificationsWithDeviceToken:),
            // SAFETY: the function matches the selector's `v@:@@` signature.
            unsafe {
                std::mem::transmute::<
                    unsafe extern "C-unwind" fn(&AnyObject, Sel, &AnyObject, &NSData),
                    objc2::runtime::Imp,
                >(did_register_with_token)
            },
        ),
        (
            sel!(application:didFailToRegisterForRemoteNotificationsWithError:),
            // SAFETY: as above.
            unsafe {
                std::mem::transmute::<
                    unsafe extern "C-unwind" fn(&AnyObject, Sel, &AnyObject, &NSError),
                    objc2::runtime::Imp,
                >(did_fail_to_register)
            },
        ),
    ];

    for (sel, imp) in hooks {
        // SAFETY: adding a method with a matching type encoding to a live
        // class. class_addMethod refuses (returns NO) if the class already
        // implements the selector, in which case the existing one wins.
        let added = unsafe {
            objc2::ffi::class_addMethod(
                class as *const AnyClass as *mut AnyClass,
                sel,
                imp,
                TYPES.as_ptr(),
            )
        };
        if !added.as_bool() {
            warn!(selector = %sel, "application delegate already implements remote registration callback");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// NotificationCenter
// ---------------------------------------------------------------------------

pub struct IosNotificationCenter;

impl IosNotificationCenter {
    /// Install the notification-center delegate. Main thread only.
    pub fn new(sink: Arc<dyn EventSink>) -> Result<Self> {
        let mtm = require_main_thread()?;
        let delegate = NotificationDelegate::new(mtm, sink.clone());
        let center = current_center();
        // SAFETY: setDelegate: stores a weak reference; DELEGATE keeps it alive.
        unsafe { center.setDelegate(Some(ProtocolObject::from_ref(&*delegate))) };
        DELEGATE.with(|slot| *slot.borrow_mut() = Some(delegate));

        if REGISTRATION_SINK.set(sink).is_err() {
            debug!("registration sink already installed");
        }
        Ok(Self)
    }
}

impl NotificationCenter for IosNotificationCenter {
    fn platform_name(&self) -> &str {
        "iOS"
    }

    fn request_authorization(&self, options: NotificationOptions, completion: AuthorizationCallback) {
        let completion = Cell::new(Some(completion));
        let block = RcBlock::new(move |granted: Bool, error: *mut NSError| {
            let Some(completion) = completion.take() else { return };
            // SAFETY: UIKit passes either nil or a valid NSError.
            let result = match unsafe { error.as_ref() } {
                Some(err) if !granted.as_bool() => Err(ShellError::Authorization(
                    err.localizedDescription().to_string(),
                )),
                _ => Ok(granted.as_bool()),
            };
            completion(result);
        });
        // SAFETY: the block has the `void (^)(BOOL, NSError *)` signature the
        // selector expects and is copied by the callee.
        unsafe {
            current_center()
                .requestAuthorizationWithOptions_completionHandler(authorization_options(options), &block);
        }
    }

    fn register_for_remote_notifications(&self) {
        let Some(mtm) = MainThreadMarker::new() else {
            warn!("registerForRemoteNotifications called off the main thread");
            return;
        };
        static HOOKS: Once = Once::new();
        HOOKS.call_once(|| {
            if let Err(e) = install_app_delegate_hooks(mtm) {
                warn!(error = %e, "remote registration callbacks not installed");
            }
        });
        info!("registering for remote notifications");
        UIApplication::sharedApplication(mtm).registerForRemoteNotifications();
    }

    fn submit(&self, request: NotificationRequest) -> Result<()> {
        let content = UNMutableNotificationContent::new();
        let entries = request.metadata.storable_entries();
        let keys: Vec<Retained<NSString>> = entries.iter().map(|(k, _)| NSString::from_str(k)).collect();
        let values: Vec<Retained<NSObject>> =
            entries.into_iter().map(|(_, v)| user_info_object(v)).collect();
        let key_refs: Vec<&NSString> = keys.iter().map(|k| &**k).collect();
        let value_refs: Vec<&NSObject> = values.iter().map(|v| &**v).collect();
        let user_info = NSDictionary::from_slices(&key_refs, &value_refs);

        // SAFETY: setters on a freshly created mutable content object.
        unsafe {
            content.setTitle(&NSString::from_str(&request.title));
            content.setBody(&NSString::from_str(&request.body));
            if foreground_presentation().sound {
                content.setSound(Some(&UNNotificationSound::defaultSound()));
            }
            if let Some(badge) = request.badge {
                content.setBadge(Some(&NSNumber::new_i64(badge)));
            }
            let _: () = msg_send![&content, setUserInfo: &*user_info];
        }

        let identifier = NSString::from_str(&request.id.to_string());
        // SAFETY: a nil trigger means "deliver now".
        let ns_request = unsafe {
            UNNotificationRequest::requestWithIdentifier_content_trigger(&identifier, &content, None)
        };

        let id = request.id;
        let block = RcBlock::new(move |error: *mut NSError| {
            // SAFETY: nil or a valid NSError.
            if let Some(err) = unsafe { error.as_ref() } {
                warn!(%id, error = %err.localizedDescription(), "local notification rejected");
            }
        });
        // SAFETY: completion block signature matches `void (^)(NSError *)`.
        unsafe {
            current_center().addNotificationRequest_withCompletionHandler(&ns_request, Some(&block));
        }
        debug!(%id, platform = self.platform_name(), "local notification queued");
        Ok(())
    }
}
