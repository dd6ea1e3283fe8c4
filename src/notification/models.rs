#[derive(Debug)]
pub struct PasswordResetNotification {
    pub email: String,
    pub otp: String,
}

#[derive(Debug)]
pub enum Notification {
    PasswordReset(PasswordResetNotification),
}

impl Notification {
    pub fn recipient(&self) -> &str {
        match self {
            Notification::PasswordReset(data) => &data.email,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Notification::PasswordReset(_) => "Password Reset OTP",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notification::PasswordReset(data) => {
                format!("Your OTP for password reset is {}", data.otp)
            }
        }
    }
}
