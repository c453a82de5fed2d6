//! Initial database migration.
//!
//! Creates the read-only collaborator tables (classes, students, guardians),
//! the fee catalog, obligations, payments, the reversal audit trail and the
//! receipt number sequence.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ACADEMIC STRUCTURE (collaborator facts)
        // ============================================================
        db.execute_unprepared(CLASSES_SQL).await?;
        db.execute_unprepared(STUDENTS_SQL).await?;

        // ============================================================
        // PART 3: FEE CATALOG & OBLIGATIONS
        // ============================================================
        db.execute_unprepared(FEE_CATEGORIES_SQL).await?;
        db.execute_unprepared(OBLIGATIONS_SQL).await?;

        // ============================================================
        // PART 4: PAYMENTS & REVERSALS
        // ============================================================
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(PAYMENT_REVERSALS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE fee_frequency AS ENUM ('monthly', 'quarterly', 'semester', 'annual', 'one-time');

CREATE TYPE obligation_status AS ENUM ('pending', 'partial', 'paid', 'overdue', 'waived');

CREATE TYPE payment_method AS ENUM ('cash', 'card', 'bank_transfer', 'cheque', 'online', 'upi');
";

const CLASSES_SQL: &str = r"
CREATE TABLE classes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL,
    academic_year VARCHAR(20) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (name, academic_year)
);

CREATE TABLE class_teachers (
    class_id UUID NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
    teacher_id UUID NOT NULL,
    PRIMARY KEY (class_id, teacher_id)
);

CREATE INDEX idx_class_teachers_teacher ON class_teachers(teacher_id);
";

const STUDENTS_SQL: &str = r"
CREATE TABLE students (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL UNIQUE,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    admission_number VARCHAR(50) NOT NULL UNIQUE,
    class_id UUID REFERENCES classes(id) ON DELETE SET NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_students_class ON students(class_id) WHERE is_active;

CREATE TABLE student_guardians (
    student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    guardian_id UUID NOT NULL,
    relationship VARCHAR(50),
    PRIMARY KEY (student_id, guardian_id)
);

CREATE INDEX idx_student_guardians_guardian ON student_guardians(guardian_id);
";

const FEE_CATEGORIES_SQL: &str = r"
CREATE TABLE fee_categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(200) NOT NULL,
    description TEXT,
    amount NUMERIC(12, 2) NOT NULL CHECK (amount >= 0),
    frequency fee_frequency NOT NULL,
    is_mandatory BOOLEAN NOT NULL DEFAULT false,
    academic_year VARCHAR(20),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_fee_categories_active ON fee_categories(is_active, academic_year);
";

const OBLIGATIONS_SQL: &str = r"
CREATE TABLE student_fee_obligations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    student_id UUID NOT NULL REFERENCES students(id),
    fee_category_id UUID NOT NULL REFERENCES fee_categories(id),
    base_amount NUMERIC(12, 2) NOT NULL CHECK (base_amount >= 0),
    discount_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
    due_date DATE NOT NULL,
    status obligation_status NOT NULL DEFAULT 'pending',
    remarks TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_discount_range CHECK (discount_amount >= 0 AND discount_amount <= base_amount),
    CONSTRAINT uq_obligation_student_category_due UNIQUE (student_id, fee_category_id, due_date)
);

CREATE INDEX idx_obligations_category ON student_fee_obligations(fee_category_id);
CREATE INDEX idx_obligations_due_status ON student_fee_obligations(due_date, status);
";

const PAYMENTS_SQL: &str = r"
CREATE SEQUENCE payment_receipt_seq START WITH 1 INCREMENT BY 1 NO CYCLE;

CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    obligation_id UUID NOT NULL REFERENCES student_fee_obligations(id) ON DELETE RESTRICT,
    amount NUMERIC(12, 2) NOT NULL CHECK (amount > 0),
    payment_date DATE NOT NULL,
    method payment_method NOT NULL,
    transaction_reference VARCHAR(100),
    receipt_number VARCHAR(50) NOT NULL UNIQUE,
    processed_by UUID NOT NULL,
    remarks TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_reference_for_non_cash
        CHECK (method = 'cash' OR (transaction_reference IS NOT NULL AND transaction_reference <> ''))
);

CREATE INDEX idx_payments_obligation ON payments(obligation_id);
CREATE INDEX idx_payments_date_method ON payments(payment_date, method);
";

const PAYMENT_REVERSALS_SQL: &str = r"
CREATE TABLE payment_reversals (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    payment_id UUID NOT NULL UNIQUE,
    obligation_id UUID NOT NULL REFERENCES student_fee_obligations(id),
    amount NUMERIC(12, 2) NOT NULL,
    method payment_method NOT NULL,
    transaction_reference VARCHAR(100),
    receipt_number VARCHAR(50) NOT NULL,
    payment_date DATE NOT NULL,
    processed_by UUID NOT NULL,
    reason TEXT NOT NULL CHECK (reason <> ''),
    reversed_by UUID NOT NULL,
    reversed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    paid_before NUMERIC(12, 2) NOT NULL,
    paid_after NUMERIC(12, 2) NOT NULL,
    status_before obligation_status NOT NULL,
    status_after obligation_status NOT NULL
);

CREATE INDEX idx_payment_reversals_obligation ON payment_reversals(obligation_id, reversed_at);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS payment_reversals;
DROP TABLE IF EXISTS payments;
DROP SEQUENCE IF EXISTS payment_receipt_seq;
DROP TABLE IF EXISTS student_fee_obligations;
DROP TABLE IF EXISTS fee_categories;
DROP TABLE IF EXISTS student_guardians;
DROP TABLE IF EXISTS students;
DROP TABLE IF EXISTS class_teachers;
DROP TABLE IF EXISTS classes;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS obligation_status;
DROP TYPE IF EXISTS fee_frequency;
";
