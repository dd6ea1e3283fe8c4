use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::course::models::Course;
use crate::payment::models::Payment;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub course_name: String,
    pub description: String,
    pub image: String,
    pub video: String,
    pub old_price: f64,
    pub new_price: f64,
}

impl From<&Course> for CourseDetails {
    fn from(course: &Course) -> Self {
        CourseDetails {
            id: course.id,
            course_name: course.course_name.clone(),
            description: course.description.clone(),
            image: course.image.clone(),
            video: course.video.clone(),
            old_price: course.old_price,
            new_price: course.new_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub status: String,
    pub utr_number: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDetails {
    fn from(payment: Payment) -> Self {
        PaymentDetails {
            id: payment.id,
            status: payment.status,
            utr_number: payment.utr_number,
            user_email: payment.user_email,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedCourse {
    pub course_details: CourseDetails,
    pub payment_details: PaymentDetails,
}
