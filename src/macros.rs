//! This module contains the macros used in the project.

/// Ask for a secret value (hidden input) and save it into the configuration
macro_rules! config_password {
    ($config:ident, $setting_name:ident, $struct_name:ident, $key_name:ident, $string:expr) => {{
        println!(concat!("Please enter ", $string, ":"));
        let value = $crate::utils::get_password()?;
        let cloned_value = value.clone();
        $config.update(|config_data| {
            if let Some(local_config) = config_data.$setting_name.as_mut() {
                local_config.$key_name = Some(cloned_value);
            } else {
                config_data.$setting_name = Some($struct_name {
                    $key_name: Some(cloned_value),
                    ..Default::default()
                });
            }
        })?;
        value
    }};
}

/// Read a secret from the configuration, asking for it when missing
macro_rules! config_password_wrap {
    ($config:ident, $setting_name:ident, $struct_name:ident, $key_name:ident, $string:expr) => {
        match &$config.config_data.$setting_name {
            Some($struct_name {
                $key_name: Some(value),
                ..
            }) if !value.trim().is_empty() => value.clone(),
            _ => $crate::macros::config_password!(
                $config,
                $setting_name,
                $struct_name,
                $key_name,
                $string
            ),
        }
    };
}

pub(crate) use config_password;
pub(crate) use config_password_wrap;
