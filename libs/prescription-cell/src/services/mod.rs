pub mod medication;
pub mod prescription;

pub use medication::MedicationService;
pub use prescription::PrescriptionService;
