pub mod vector_math;
